// tests/common/mod.rs
//! In-memory capabilities shared by the integration tests.
#![allow(dead_code)]

use article2notion::error::{AppError, FetchError, StorageError};
use article2notion::media::HostRewrite;
use article2notion::{
    ArticleExtractor, DefaultTemplate, DestinationRecord, FetchedMedia, MediaConfig, MediaRehoster,
    MediaSource, MigrationPipeline, NormalizeOptions, ObjectStore, PageId, PageSource,
    PipelineSettings, PublicUrlBase, PutObject, RecordStore, StoragePrefix,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Serves pages and media from fixed maps. Unknown URLs time out.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    media: HashMap<String, FetchedMedia>,
}

impl FakeSite {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn media(mut self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        self.media.insert(
            url.to_string(),
            FetchedMedia {
                status,
                content_type: content_type.map(str::to_string),
                declared_length: Some(body.len() as u64),
                body: Bytes::copy_from_slice(body),
            },
        );
        self
    }
}

#[async_trait::async_trait]
impl PageSource for FakeSite {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        self.pages.get(url.as_str()).cloned().ok_or_else(|| FetchError::Timeout {
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl MediaSource for FakeSite {
    async fn fetch_media(&self, url: &Url) -> Result<FetchedMedia, FetchError> {
        self.media.get(url.as_str()).cloned().ok_or_else(|| FetchError::Timeout {
            url: url.to_string(),
        })
    }
}

#[derive(Default)]
pub struct MemoryBucket {
    pub objects: Mutex<Vec<PutObject>>,
}

#[async_trait::async_trait]
impl ObjectStore for MemoryBucket {
    async fn put_object(&self, object: PutObject) -> Result<(), StorageError> {
        self.objects.lock().unwrap().push(object);
        Ok(())
    }
}

/// Records every created page. Titles listed in `rejected_titles` fail like a Notion validation error.
#[derive(Default)]
pub struct MemoryRecords {
    pub created: Mutex<Vec<DestinationRecord>>,
    pub rejected_titles: Vec<String>,
}

impl MemoryRecords {
    pub fn rejecting(title: &str) -> Self {
        Self {
            rejected_titles: vec![title.to_string()],
            ..Self::default()
        }
    }

    pub fn created_titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .created
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.title.clone())
            .collect();
        titles.sort();
        titles
    }

    pub fn created_with_title(&self, title: &str) -> Option<DestinationRecord> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.title == title)
            .cloned()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecords {
    async fn create_record(&self, record: &DestinationRecord) -> Result<PageId, AppError> {
        if self.rejected_titles.contains(&record.title) {
            return Err(AppError::MalformedResponse(format!(
                "rejected record '{}'",
                record.title
            )));
        }
        self.created.lock().unwrap().push(record.clone());
        Ok(PageId::new_v4())
    }
}

pub fn media_config() -> MediaConfig {
    MediaConfig {
        body_prefix: StoragePrefix::new("articles/body").unwrap(),
        thumbnail_prefix: StoragePrefix::new("articles/thumbnail").unwrap(),
        public_base: PublicUrlBase::new("https://cdn.example.org/"),
        embed_hosts: vec!["www.youtube.com".to_string(), "player.vimeo.com".to_string()],
        host_rewrites: vec![HostRewrite {
            from: "old.example.org".to_string(),
            to: "www.example.org".to_string(),
        }],
    }
}

/// A pipeline over fakes, with small stage bounds so ordering is exercised.
pub fn pipeline(site: FakeSite, bucket: Arc<MemoryBucket>, records: Arc<MemoryRecords>) -> MigrationPipeline {
    let site = Arc::new(site);
    let rehoster = MediaRehoster::new(site.clone(), bucket, media_config());
    let extractor = ArticleExtractor::new(
        site,
        Arc::new(DefaultTemplate::default()),
        rehoster.clone(),
        NormalizeOptions::default(),
    );

    MigrationPipeline::new(
        extractor,
        rehoster,
        records,
        PipelineSettings {
            extract_workers: 2,
            create_concurrency: 2,
        },
    )
}

/// A page in the source site's article layout.
pub fn article_page(title: &str, date: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <header><nav>menu</nav></header>
        <article><h1>{title}</h1><p>{date}</p>{body}</article>
        </body></html>"#
    )
}
