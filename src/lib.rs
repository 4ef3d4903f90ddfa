// src/lib.rs
//! article2notion library: migrates published articles into Notion databases.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FetchError`, `InputError`, `StorageError`, `ValidationError`
//! - **Configuration**: `MigrationConfig`
//! - **Domain model**: `InputRow`, `ExtractedArticle`, `BlockNode`, `DestinationRecord`
//! - **Domain types**: `ContentType`, `Collection`, `Slug`, `PageId`, `DatabaseId`, etc.
//! - **Capabilities**: `PageSource`, `MediaSource`, `ObjectStore`, `RecordStore`
//! - **Pipeline**: `MigrationPipeline`, `BatchReport`

pub mod blocks;
pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod input;
pub mod markup;
pub mod media;
pub mod model;
pub mod notion;
pub mod pipeline;
pub mod report;
pub mod routing;
pub mod storage;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, FetchError, InputError, NotionErrorCode, StorageError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, MigrationConfig};

// --- Domain Model ---
pub use crate::model::{BlockNode, DestinationRecord, ExtractedArticle, InputRow, RichText};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, Collection, ContentType, DatabaseId, PageId, Slug, StoragePrefix, ValidatedUrl,
};

// --- Capabilities ---
pub use crate::fetch::{FetchedMedia, HttpFetcher, MediaSource, PageSource};
pub use crate::notion::{CollectionDatabases, NotionHttpClient, PropertyNames, RecordStore};
pub use crate::storage::{ObjectStore, PublicUrlBase, PutObject, S3ObjectStore, S3Settings};

// --- Transformation ---
pub use crate::blocks::{resolve_media, to_blocks, ResolvedBlocks};
pub use crate::extractor::{ArticleExtractor, ArticleTemplate, DefaultTemplate};
pub use crate::markup::{normalize, NormalizeOptions};
pub use crate::media::{MediaConfig, MediaRehoster, MediaVariant, UploadResult};
pub use crate::routing::build_record;

// --- Pipeline ---
pub use crate::pipeline::{MigrationPipeline, PipelineSettings, RowOutcome};
pub use crate::report::{BatchReport, BatchStats, EntryOutcome, ReportEntry, Stage};
