// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Maximum number of children accepted by one create-page or append call.
pub const NOTION_MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Deepest block level accepted in one create or append request, top level included.
pub const NOTION_MAX_BLOCK_DEPTH: usize = 3;

/// Maximum length of a single rich text content string.
pub const NOTION_MAX_RICH_TEXT_LENGTH: usize = 2000;

/// Code block language used when the source language is not one Notion knows.
pub const NOTION_FALLBACK_CODE_LANGUAGE: &str = "plain text";

/// Code languages accepted by Notion that commonly appear in article markup.
pub const NOTION_CODE_LANGUAGES: &[&str] = &[
    "bash",
    "c",
    "c++",
    "css",
    "go",
    "html",
    "java",
    "javascript",
    "json",
    "markdown",
    "python",
    "ruby",
    "rust",
    "shell",
    "sql",
    "typescript",
    "xml",
    "yaml",
];

// ---------------------------------------------------------------------------
// Article template markers
// ---------------------------------------------------------------------------

/// Inner markup of the article root's first child on a missing page.
pub const ARTICLE_NOT_FOUND_MARKER: &str = "NOT FOUND";

/// Text that marks a press release whose real content lives elsewhere.
pub const PRESS_RELEASE_MARKER: &str = "プレスリリース";

/// Direct children of the article root that never carry article content.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "nav", "aside", "form"];

/// Category tag that names the news collection itself.
pub const RESERVED_NEWS_TAG: &str = "news";

// ---------------------------------------------------------------------------
// Media rehosting
// ---------------------------------------------------------------------------

/// Hosts whose sources become embed blocks instead of rehosted images.
pub const EMBED_HOSTS: &[&str] = &["www.youtube.com", "player.vimeo.com"];

/// Response content type that marks a media URL as not worth keeping.
pub const DISALLOWED_MEDIA_CONTENT_TYPE: &str = "text/plain";

/// Extension used when neither the URL nor the response names one.
pub const FALLBACK_MEDIA_EXTENSION: &str = "bin";

/// Longest extension accepted from a URL path before falling back.
pub const MAX_EXTENSION_LENGTH: usize = 5;

/// Default key prefix for media found in article bodies.
pub const DEFAULT_BODY_PREFIX: &str = "articles/body";

/// Default key prefix for `og:image` thumbnails.
pub const DEFAULT_THUMBNAIL_PREFIX: &str = "articles/thumbnail";

/// Upper bound on one media download, in bytes.
pub const DEFAULT_MAX_MEDIA_BYTES: u64 = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Concurrency and timeouts
// ---------------------------------------------------------------------------

/// Timeout applied to every upstream HTTP request.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Concurrent record creations against the Notion API.
///
/// Notion rate-limits integrations to roughly three requests per second.
pub const DEFAULT_CREATE_CONCURRENCY: usize = 3;

/// Hard cap on extraction workers regardless of configuration.
pub const MAX_EXTRACT_WORKERS: usize = 32;

// ---------------------------------------------------------------------------
// Destination property defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_TITLE_PROPERTY: &str = "Name";
pub const DEFAULT_SLUG_PROPERTY: &str = "Slug";
pub const DEFAULT_TAGS_PROPERTY: &str = "Tags";
pub const DEFAULT_PUBLISHED_PROPERTY: &str = "Published";
pub const DEFAULT_DATE_PROPERTY: &str = "Date";
pub const DEFAULT_THUMBNAIL_PROPERTY: &str = "Thumbnail";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
