// src/routing/mod.rs
//! Routing and record shaping per content type.

use crate::constants::RESERVED_NEWS_TAG;
use crate::model::{ArticleKind, BlockNode, DestinationRecord, ExtractedArticle};
use crate::types::{ContentType, ValidatedUrl};
use chrono::{DateTime, Utc};
use std::fmt;

/// Why an extracted article produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSkip {
    /// The URL's first path segment names no known collection
    UnknownCollection { source_url: ValidatedUrl },
}

impl fmt::Display for RecordSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSkip::UnknownCollection { source_url } => {
                write!(f, "no destination collection for {}", source_url)
            }
        }
    }
}

/// Builds the destination record for an article whose blocks are already resolved.
///
/// `now` stands in for the publication date when the page showed none.
pub fn build_record(
    article: ExtractedArticle,
    content_type: ContentType,
    children: Vec<BlockNode>,
    degraded_media: usize,
    now: DateTime<Utc>,
) -> Result<DestinationRecord, RecordSkip> {
    let Some(collection) = article.destination_collection else {
        return Err(RecordSkip::UnknownCollection {
            source_url: article.source_url,
        });
    };

    let children = match article.kind {
        ArticleKind::Standard => children,
        ArticleKind::PressReleaseRedirect => Vec::new(),
    };

    Ok(DestinationRecord {
        collection,
        title: article.title,
        slug: article.slug,
        tags: record_tags(content_type, article.categories),
        published: true,
        published_at: article.published_at.unwrap_or(now),
        thumbnail_url: article.thumbnail_url,
        children,
        source_url: article.source_url,
        degraded_media,
    })
}

/// Tags for types that carry them; news drops its own collection tag.
fn record_tags(content_type: ContentType, categories: Option<Vec<String>>) -> Option<Vec<String>> {
    if !content_type.carries_tags() {
        return None;
    }
    let tags = categories.unwrap_or_default();
    let tags = match content_type {
        ContentType::News => tags
            .into_iter()
            .filter(|tag| !tag.eq_ignore_ascii_case(RESERVED_NEWS_TAG))
            .collect(),
        _ => tags,
    };
    Some(tags)
}
