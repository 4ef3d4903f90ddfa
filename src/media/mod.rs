// src/media/mod.rs
//! Media rehosting: moving images out of the source site into controlled storage.
//!
//! `MediaRehoster::rehost` never returns an error. Every outcome, including
//! transport failures, is an `UploadResult` value the caller acts on.

pub mod data_uri;
pub mod keys;

pub use keys::MediaVariant;

use crate::constants::DISALLOWED_MEDIA_CONTENT_TYPE;
use crate::fetch::MediaSource;
use crate::storage::{ObjectStore, PublicUrlBase, PutObject, StoredObject};
use crate::types::StoragePrefix;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Why a reference produced no stored object, without being a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSkip {
    /// The reference was empty; the block is left as it is
    EmptySource,
    /// The source answered 404
    NotFound,
    /// The source answered with a content type that is never media
    DisallowedContentType(String),
}

impl MediaSkip {
    /// Whether the block holding this reference should be removed.
    pub fn drops_block(&self) -> bool {
        !matches!(self, MediaSkip::EmptySource)
    }
}

impl std::fmt::Display for MediaSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSkip::EmptySource => write!(f, "empty media reference"),
            MediaSkip::NotFound => write!(f, "media not found (404)"),
            MediaSkip::DisallowedContentType(ct) => write!(f, "disallowed content type {}", ct),
        }
    }
}

/// Why rehosting failed. The original reference stays in place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaFailure {
    #[error("invalid media reference {reference}: {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("could not fetch media: {0}")]
    Fetch(String),

    #[error("media source responded with HTTP {0}")]
    Status(u16),

    #[error("could not decode inline media: {0}")]
    Decode(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

/// Outcome of one rehost attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Stored(StoredObject),
    /// The source is an embeddable player; storage was bypassed
    Embed { url: String },
    Skipped(MediaSkip),
    Failed(MediaFailure),
}

/// Rewrites one legacy media host to its current canonical host before fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRewrite {
    pub from: String,
    pub to: String,
}

/// Injected rehosting policy: prefixes, CDN base, embed hosts and host rewrites.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub body_prefix: StoragePrefix,
    pub thumbnail_prefix: StoragePrefix,
    pub public_base: PublicUrlBase,
    pub embed_hosts: Vec<String>,
    pub host_rewrites: Vec<HostRewrite>,
}

impl MediaConfig {
    fn prefix_for(&self, variant: MediaVariant) -> &StoragePrefix {
        match variant {
            MediaVariant::Body => &self.body_prefix,
            MediaVariant::Thumbnail => &self.thumbnail_prefix,
        }
    }

    fn is_embed_host(&self, url: &Url) -> bool {
        url.host_str()
            .map(|host| self.embed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)))
            .unwrap_or(false)
    }

    fn rewrite_host(&self, url: &mut Url) -> Result<(), url::ParseError> {
        let Some(host) = url.host_str().map(str::to_string) else {
            return Ok(());
        };
        if let Some(rewrite) = self
            .host_rewrites
            .iter()
            .find(|r| r.from.eq_ignore_ascii_case(&host))
        {
            log::debug!("Rewriting media host {} -> {}", rewrite.from, rewrite.to);
            url.set_host(Some(&rewrite.to))?;
        }
        Ok(())
    }
}

/// Downloads or decodes media and uploads it under a fresh key.
#[derive(Clone)]
pub struct MediaRehoster {
    source: Arc<dyn MediaSource>,
    store: Arc<dyn ObjectStore>,
    config: MediaConfig,
}

impl MediaRehoster {
    pub fn new(
        source: Arc<dyn MediaSource>,
        store: Arc<dyn ObjectStore>,
        config: MediaConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Rehosts a reference found on the page at `base`.
    ///
    /// Relative and protocol-relative references resolve against `base`.
    pub async fn rehost(&self, reference: &str, base: &Url, variant: MediaVariant) -> UploadResult {
        let reference = reference.trim();
        if reference.is_empty() {
            return UploadResult::Skipped(MediaSkip::EmptySource);
        }

        if reference.starts_with("data:") {
            return self.rehost_inline(reference, variant).await;
        }

        let mut url = match base.join(reference) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return UploadResult::Failed(MediaFailure::InvalidReference {
                    reference: reference.to_string(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                })
            }
            Err(e) => {
                return UploadResult::Failed(MediaFailure::InvalidReference {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if self.config.is_embed_host(&url) {
            return UploadResult::Embed {
                url: url.to_string(),
            };
        }

        if let Err(e) = self.config.rewrite_host(&mut url) {
            return UploadResult::Failed(MediaFailure::InvalidReference {
                reference: reference.to_string(),
                reason: e.to_string(),
            });
        }

        self.rehost_remote(&url, variant).await
    }

    async fn rehost_inline(&self, reference: &str, variant: MediaVariant) -> UploadResult {
        let inline = match data_uri::parse_data_uri(reference) {
            Ok(inline) => inline,
            Err(e) => return UploadResult::Failed(MediaFailure::Decode(e.to_string())),
        };

        let extension = keys::extension_from_media_type(&inline.media_type)
            .unwrap_or_else(|| crate::constants::FALLBACK_MEDIA_EXTENSION.to_string());
        let length = inline.data.len() as u64;

        self.upload(
            variant,
            &extension,
            inline.media_type,
            Bytes::from(inline.data),
            Some(length),
        )
        .await
    }

    async fn rehost_remote(&self, url: &Url, variant: MediaVariant) -> UploadResult {
        let media = match self.source.fetch_media(url).await {
            Ok(media) => media,
            Err(e) => return UploadResult::Failed(MediaFailure::Fetch(e.to_string())),
        };

        if media.status == 404 {
            log::debug!("Dropping media {}: not found", url);
            return UploadResult::Skipped(MediaSkip::NotFound);
        }

        let essence = media.mime_essence();
        if essence.as_deref() == Some(DISALLOWED_MEDIA_CONTENT_TYPE) {
            log::debug!("Dropping media {}: served as text/plain", url);
            return UploadResult::Skipped(MediaSkip::DisallowedContentType(
                DISALLOWED_MEDIA_CONTENT_TYPE.to_string(),
            ));
        }

        if !(200..300).contains(&media.status) {
            return UploadResult::Failed(MediaFailure::Status(media.status));
        }

        let extension = keys::resolve_extension(url.as_str(), variant, essence.as_deref());
        let content_type = keys::resolve_content_type(essence.as_deref(), &extension);

        self.upload(
            variant,
            &extension,
            content_type,
            media.body,
            media.declared_length,
        )
        .await
    }

    async fn upload(
        &self,
        variant: MediaVariant,
        extension: &str,
        content_type: String,
        body: Bytes,
        content_length: Option<u64>,
    ) -> UploadResult {
        let key = keys::object_key(self.config.prefix_for(variant), extension);

        let request = PutObject {
            key: key.clone(),
            body,
            content_type: content_type.clone(),
            content_length,
        };

        match self.store.put_object(request).await {
            Ok(()) => {
                let public_url = self.config.public_base.url_for(&key);
                log::debug!("Rehosted media as {}", public_url);
                UploadResult::Stored(StoredObject {
                    key,
                    public_url,
                    content_type,
                })
            }
            Err(e) => UploadResult::Failed(MediaFailure::Upload(e.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory media source and object store for unit tests.

    use super::*;
    use crate::error::{FetchError, StorageError};
    use crate::fetch::FetchedMedia;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeMediaSource {
        responses: HashMap<String, FetchedMedia>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakeMediaSource {
        pub fn with(mut self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
            self.responses.insert(
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
    impl MediaSource for FakeMediaSource {
        async fn fetch_media(&self, url: &Url) -> Result<FetchedMedia, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.responses
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Transport {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                })
        }
    }

    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: Mutex<Vec<PutObject>>,
        pub fail: bool,
    }

    #[async_trait::async_trait]
    impl ObjectStore for MemoryStore {
        async fn put_object(&self, object: PutObject) -> Result<(), StorageError> {
            if self.fail {
                return Err(StorageError::Transport {
                    key: object.key,
                    message: "bucket unreachable".to_string(),
                });
            }
            self.objects.lock().unwrap().push(object);
            Ok(())
        }
    }

    pub fn media_config() -> MediaConfig {
        MediaConfig {
            body_prefix: StoragePrefix::new("articles/body").unwrap(),
            thumbnail_prefix: StoragePrefix::new("articles/thumbnail").unwrap(),
            public_base: PublicUrlBase::new("https://cdn.example.org"),
            embed_hosts: vec!["www.youtube.com".to_string(), "player.vimeo.com".to_string()],
            host_rewrites: vec![HostRewrite {
                from: "old.example.org".to_string(),
                to: "www.example.org".to_string(),
            }],
        }
    }

    pub fn rehoster(source: FakeMediaSource, store: Arc<MemoryStore>) -> MediaRehoster {
        MediaRehoster::new(Arc::new(source), store, media_config())
    }
}
