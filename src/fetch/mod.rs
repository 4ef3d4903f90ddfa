// src/fetch/mod.rs
//! Upstream HTTP: retrieving article pages and media files.
//!
//! Extraction and rehosting depend on the `PageSource` and `MediaSource`
//! traits; `HttpFetcher` is the reqwest implementation of both.

use crate::error::FetchError;
use bytes::{Bytes, BytesMut};
use reqwest::{header, Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// The ability to retrieve an article page as HTML text.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;
}

/// A media response, with the body already read.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub status: u16,
    pub content_type: Option<String>,
    /// The length the response declared, if it declared one.
    pub declared_length: Option<u64>,
    pub body: Bytes,
}

impl FetchedMedia {
    /// Content type without parameters, lowercased (`image/png; q=1` → `image/png`).
    pub fn mime_essence(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }
}

/// The ability to retrieve a media file's bytes.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_media(&self, url: &Url) -> Result<FetchedMedia, FetchError>;
}

/// A reqwest client with a per-request timeout and a media size bound.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_media_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_media_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            max_media_bytes,
        })
    }

    async fn get(&self, url: &Url) -> Result<Response, FetchError> {
        log::debug!("GET {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))
    }

    /// Reads a body whose length was declared up front into a buffer of exactly that size.
    async fn read_sized(
        &self,
        url: &Url,
        mut response: Response,
        length: u64,
    ) -> Result<Bytes, FetchError> {
        let mut buffer = BytesMut::with_capacity(length as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?
        {
            if (buffer.len() + chunk.len()) as u64 > length {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message: format!("body is longer than the declared {} bytes", length),
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        if buffer.len() as u64 != length {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: format!(
                    "body truncated: received {} of {} declared bytes",
                    buffer.len(),
                    length
                ),
            });
        }

        Ok(buffer.freeze())
    }

    /// Buffers a body of unknown length entirely in memory.
    async fn read_buffered(&self, url: &Url, response: Response) -> Result<Bytes, FetchError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        if body.len() as u64 > self.max_media_bytes {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: self.max_media_bytes,
            });
        }
        Ok(body)
    }
}

#[async_trait::async_trait]
impl PageSource for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();

        // Missing pages render the template's own not-found marker, so 404 bodies are kept.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))
    }
}

#[async_trait::async_trait]
impl MediaSource for HttpFetcher {
    async fn fetch_media(&self, url: &Url) -> Result<FetchedMedia, FetchError> {
        let response = self.get(url).await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let declared_length = response.content_length();

        if !status.is_success() {
            return Ok(FetchedMedia {
                status: status.as_u16(),
                content_type,
                declared_length,
                body: Bytes::new(),
            });
        }

        let body = match declared_length {
            Some(length) if length > self.max_media_bytes => {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit: self.max_media_bytes,
                });
            }
            Some(length) => self.read_sized(url, response, length).await?,
            None => self.read_buffered(url, response).await?,
        };

        Ok(FetchedMedia {
            status: status.as_u16(),
            content_type,
            declared_length,
            body,
        })
    }
}
