use crate::types::{Collection, ContentType, Slug, ValidatedUrl};
use chrono::{DateTime, Utc};

/// One line of the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub source_url: ValidatedUrl,
    pub categories: Vec<String>,
    pub content_type: ContentType,
}

impl InputRow {
    pub fn new(source_url: ValidatedUrl, raw_categories: &str, content_type: ContentType) -> Self {
        Self {
            source_url,
            categories: split_categories(raw_categories),
            content_type,
        }
    }
}

/// Splits a comma or comma-space separated category field, dropping blanks.
pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which template variant a page turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleKind {
    /// A regular article whose body is migrated
    Standard,
    /// A press-release stub that only redirects elsewhere; it has no body
    PressReleaseRedirect,
}

/// Everything extracted from one source page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    pub source_url: ValidatedUrl,
    pub title: String,
    pub raw_body_html: String,
    pub normalized_markup: String,
    pub categories: Option<Vec<String>>,
    /// Rehosted thumbnail URL; never the original remote URL.
    pub thumbnail_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub slug: Slug,
    pub destination_collection: Option<Collection>,
    pub kind: ArticleKind,
}

impl ExtractedArticle {
    pub fn has_body(&self) -> bool {
        matches!(self.kind, ArticleKind::Standard) && !self.normalized_markup.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_accept_comma_and_comma_space() {
        assert_eq!(split_categories("news, updates,events"), vec!["news", "updates", "events"]);
        assert!(split_categories(" , ").is_empty());
        assert!(split_categories("").is_empty());
    }
}
