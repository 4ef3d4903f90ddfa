// src/notion/client.rs
//! Pure HTTP client wrapper for the Notion API.
//!
//! A thin wrapper around reqwest that handles authentication and basic
//! request/response operations. Request shaping lives in `request`.

use super::request::{create_page_request, split_children, AppendChildrenRequest, PropertyNames};
use super::{CollectionDatabases, RecordStore};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use crate::model::DestinationRecord;
use crate::types::{ApiKey, PageId};
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    databases: CollectionDatabases,
    properties: PropertyNames,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(
        api_key: &ApiKey,
        databases: CollectionDatabases,
        properties: PropertyNames,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            databases,
            properties,
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::InvalidConfiguration {
                    key: "NOTION_TOKEN".to_string(),
                    reason: format!("not usable as a header value: {}", e),
                }
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("POST {}", url);
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// Makes a PATCH request with JSON body to the specified endpoint.
    pub async fn patch<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("PATCH {}", url);
        Ok(self.client.patch(url).json(body).send().await?)
    }

    async fn append_children(&self, page: &PageId, record: &DestinationRecord) -> Result<(), AppError> {
        let (_, overflow) = split_children(&record.children);
        let endpoint = format!("blocks/{}/children", page.to_dashed());

        for (index, batch) in overflow.iter().enumerate() {
            log::debug!(
                "Appending batch {} ({} blocks) to {}",
                index + 1,
                batch.len(),
                page
            );
            let response = self
                .patch(&endpoint, &AppendChildrenRequest { children: *batch })
                .await?;
            let result = extract_response_text(response).await?;
            check_status(&result)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for NotionHttpClient {
    async fn create_record(&self, record: &DestinationRecord) -> Result<PageId, AppError> {
        let database = self.databases.get(record.collection).ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "no database configured for the {} collection",
                record.collection
            ))
        })?;

        let request = create_page_request(record, database, &self.properties);
        let response = self.post("pages", &request).await?;
        let result = extract_response_text(response).await?;
        let page = parse_created_page(&result)?;

        self.append_children(&page, record).await?;
        Ok(page)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}

#[derive(Debug, Deserialize)]
struct NotionErrorBody {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

/// Maps a non-success response to `AppError::NotionService`.
fn check_status(result: &ApiResponse<String>) -> Result<(), AppError> {
    if result.status.is_success() {
        return Ok(());
    }

    if let Ok(error) = serde_json::from_str::<NotionErrorBody>(&result.data) {
        return Err(AppError::NotionService {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status: result.status,
        });
    }

    let preview: String = result.data.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    Err(AppError::NotionService {
        code: NotionErrorCode::from_http_status(result.status.as_u16()),
        message: format!("HTTP {} from {}: {}", result.status, result.url, preview),
        status: result.status,
    })
}

/// Reads the new page's id from a create-page response.
fn parse_created_page(result: &ApiResponse<String>) -> Result<PageId, AppError> {
    check_status(result)?;
    let created: CreatedPage = serde_json::from_str(&result.data)?;
    Ok(PageId::parse(&created.id)?)
}
