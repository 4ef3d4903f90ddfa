// src/extractor/mod.rs
//! Article extraction: from a source URL to an `ExtractedArticle`.
//!
//! The page is fetched through `PageSource` and read through an
//! `ArticleTemplate`. Parsing happens in one synchronous step that produces
//! owned values, since the parsed document cannot be held across an await.

pub mod date;
pub mod slug;
pub mod template;

pub use template::{ArticleTemplate, DefaultTemplate};

use crate::error::FetchError;
use crate::markup::{normalize, NormalizeOptions};
use crate::media::{MediaRehoster, MediaVariant, UploadResult};
use crate::model::{ArticleKind, ExtractedArticle, InputRow};
use crate::fetch::PageSource;
use crate::types::{Collection, ContentType, Slug};
use chrono::{DateTime, Utc};
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Fields read from the page before any media work.
#[derive(Debug, Clone, PartialEq)]
struct PageFields {
    title: Option<String>,
    body_html: String,
    date_text: Option<String>,
    thumbnail_reference: Option<String>,
    press_release_target: Option<String>,
    is_press_release: bool,
}

/// Fetches and reads article pages.
#[derive(Clone)]
pub struct ArticleExtractor {
    source: Arc<dyn PageSource>,
    template: Arc<dyn ArticleTemplate>,
    rehoster: MediaRehoster,
    normalize_options: NormalizeOptions,
}

impl ArticleExtractor {
    pub fn new(
        source: Arc<dyn PageSource>,
        template: Arc<dyn ArticleTemplate>,
        rehoster: MediaRehoster,
        normalize_options: NormalizeOptions,
    ) -> Self {
        Self {
            source,
            template,
            rehoster,
            normalize_options,
        }
    }

    /// Extracts one row's article. `Ok(None)` means the page has no article content.
    pub async fn extract(&self, row: &InputRow) -> Result<Option<ExtractedArticle>, FetchError> {
        self.extract_at(row, Utc::now()).await
    }

    /// As `extract`, with an explicit extraction time for types without a visible date.
    pub async fn extract_at(
        &self,
        row: &InputRow,
        now: DateTime<Utc>,
    ) -> Result<Option<ExtractedArticle>, FetchError> {
        let url = row.source_url.as_url();
        let html = self.source.fetch_page(url).await?;

        let Some(fields) = read_page(self.template.as_ref(), &html) else {
            log::info!("No article content at {}", url);
            return Ok(None);
        };

        let (kind, raw_slug) = if fields.is_press_release {
            log::debug!(
                "{} is a press-release redirect to {:?}",
                url,
                fields.press_release_target
            );
            let raw = fields
                .press_release_target
                .clone()
                .unwrap_or_else(|| slug::derive_slug(url, row.content_type));
            (ArticleKind::PressReleaseRedirect, raw)
        } else {
            (ArticleKind::Standard, slug::derive_slug(url, row.content_type))
        };

        let slug = match Slug::decode(&raw_slug) {
            Ok(slug) => slug,
            Err(e) => {
                log::warn!("Skipping {}: {}", url, e);
                return Ok(None);
            }
        };

        let (raw_body_html, normalized_markup) = match kind {
            ArticleKind::Standard => {
                let markdown = normalize(&fields.body_html, &self.normalize_options);
                (fields.body_html, markdown)
            }
            ArticleKind::PressReleaseRedirect => (String::new(), String::new()),
        };

        let published_at = published_at(row.content_type, fields.date_text.as_deref(), now);
        let destination_collection = collection_for(url);
        // Media is only stored for pages that will become records.
        let thumbnail_url = match destination_collection {
            Some(_) => self.rehost_thumbnail(fields.thumbnail_reference.as_deref(), url).await,
            None => None,
        };
        let title = fields.title.unwrap_or_else(|| slug.as_str().to_string());
        let categories = (!row.categories.is_empty()).then(|| row.categories.clone());

        Ok(Some(ExtractedArticle {
            source_url: row.source_url.clone(),
            title,
            raw_body_html,
            normalized_markup,
            categories,
            thumbnail_url,
            published_at,
            slug,
            destination_collection,
            kind,
        }))
    }

    async fn rehost_thumbnail(&self, reference: Option<&str>, base: &Url) -> Option<String> {
        let reference = reference?;
        match self.rehoster.rehost(reference, base, MediaVariant::Thumbnail).await {
            UploadResult::Stored(stored) => Some(stored.public_url),
            other => {
                log::debug!("No thumbnail for {}: {:?}", base, other);
                None
            }
        }
    }
}

/// Reads every template-driven field. `None` when there is no article root or
/// the root is the not-found placeholder.
fn read_page(template: &dyn ArticleTemplate, html: &str) -> Option<PageFields> {
    let document = Html::parse_document(html);
    let root = template.article_root(&document)?;
    if template.is_not_found(root) {
        return None;
    }

    let body_html = template.body_html(root);
    let is_press_release = template.is_press_release(&body_html);

    Some(PageFields {
        title: template.title(&document, root),
        date_text: template.date_text(root),
        thumbnail_reference: template.thumbnail_reference(&document),
        press_release_target: is_press_release
            .then(|| template.press_release_target(&document))
            .flatten(),
        is_press_release,
        body_html,
    })
}

fn published_at(
    content_type: ContentType,
    date_text: Option<&str>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if content_type.has_visible_date() {
        date_text.and_then(date::parse_loose_date)
    } else {
        Some(now)
    }
}

/// Destination collection named by the first path segment.
pub fn collection_for(url: &Url) -> Option<Collection> {
    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .and_then(Collection::from_keyword)
}
