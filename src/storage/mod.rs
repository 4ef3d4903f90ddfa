// src/storage/mod.rs
//! Object storage: the ability to write rehosted media under a public key.
//!
//! The rehoster depends on the `ObjectStore` trait, never on S3 details.

mod s3;

pub use s3::{S3ObjectStore, S3Settings};

use crate::error::StorageError;
use bytes::Bytes;

/// A single object to write.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    /// Length declared by the upstream response, when it declared one.
    pub content_length: Option<u64>,
}

/// An object that was written and can be served publicly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub public_url: String,
    pub content_type: String,
}

/// The ability to write objects to durable storage.
///
/// Keys are globally unique, so concurrent writes never conflict.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, object: PutObject) -> Result<(), StorageError>;
}

/// Composes public URLs from the CDN base and an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBase(String);

impl PublicUrlBase {
    pub fn new(base: impl Into<String>) -> Self {
        Self(base.into().trim_end_matches('/').to_string())
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.0, key.trim_start_matches('/'))
    }
}
