use super::blocks::BlockNode;
use crate::types::{Collection, Slug, ValidatedUrl};
use chrono::{DateTime, Utc};

/// A page ready to be created in a destination collection.
///
/// Write-once: there is no update path.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationRecord {
    pub collection: Collection,
    pub title: String,
    pub slug: Slug,
    /// `None` for content types that carry no tag property at all.
    pub tags: Option<Vec<String>>,
    pub published: bool,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub children: Vec<BlockNode>,
    pub source_url: ValidatedUrl,
    /// Media blocks kept pointing at their original source after a failed rehost.
    pub degraded_media: usize,
}
