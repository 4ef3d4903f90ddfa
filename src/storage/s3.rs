// src/storage/s3.rs
//! S3-compatible object store (AWS S3, DigitalOcean Spaces, MinIO).

use super::{ObjectStore, PutObject};
use crate::error::StorageError;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for non-AWS providers; `None` uses the AWS default.
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Writes objects with a public-read ACL so the CDN can serve them.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "article2notion-environment",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        log::info!(
            "Object storage: bucket '{}' in region '{}'{}",
            settings.bucket,
            settings.region,
            settings
                .endpoint
                .as_ref()
                .map(|e| format!(" via {}", e))
                .unwrap_or_default()
        );

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, object: PutObject) -> Result<(), StorageError> {
        let PutObject {
            key,
            body,
            content_type,
            content_length,
        } = object;

        // Without a declared length the body was buffered, so its size is known here.
        let length = content_length.unwrap_or(body.len() as u64);

        log::debug!("PUT s3://{}/{} ({} bytes, {})", self.bucket, key, length, content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .content_length(length as i64)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                match err {
                    SdkError::ServiceError(_) => StorageError::Rejected { key: key.clone(), message },
                    _ => StorageError::Transport { key: key.clone(), message },
                }
            })?;

        Ok(())
    }
}
