//! Async clients for the two backend collaborators of the desktop app:
//! the extraction API (document list + extracted line items) and the
//! document source (page count + per-page rasters).
//!
//! Both are plain HTTP consumers; nothing here owns view state. Callers
//! decide what to do with stale responses.

use reqwest::{Client, StatusCode};
use shared::{
    domain::DocumentId,
    error::ApiError,
    protocol::{DocumentListing, ExtractedDocument},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

mod document_source;

pub use document_source::{DocumentSource, HttpDocumentSource, PageRaster};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus {
        status: StatusCode,
        endpoint: String,
    },
    #[error("invalid backend url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Normalizes and validates the backend base URL once, at construction.
fn normalize_base_url(base_url: &str) -> Result<String, ClientError> {
    let parsed = Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(base_url.trim_end_matches('/').to_string())
}

/// Converts a non-2xx response into a typed error, preferring the backend's
/// error envelope when the body parses as one.
async fn decode_error_response(response: reqwest::Response, endpoint: &str) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => ClientError::Api(api_error),
        Err(_) => {
            warn!(%status, endpoint, "backend returned non-envelope error body");
            ClientError::UnexpectedStatus {
                status,
                endpoint: endpoint.to_string(),
            }
        }
    }
}

/// Client for the extraction API.
pub struct ExtractionClient {
    http: Client,
    base_url: String,
}

impl ExtractionClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Lists the identifiers of all documents stored on the backend.
    pub async fn list_documents(&self) -> Result<Vec<DocumentId>, ClientError> {
        let endpoint = format!("{}/files", self.base_url);
        debug!(endpoint, "extraction: list documents");
        let response = self.http.get(&endpoint).send().await?;
        if !response.status().is_success() {
            return Err(decode_error_response(response, &endpoint).await);
        }
        let listing: DocumentListing = response.json().await?;
        Ok(listing.documents)
    }

    /// Fetches the extracted line-item data for one document. The result is
    /// a complete snapshot; partial extraction is never returned.
    pub async fn fetch_extraction(
        &self,
        document_id: &DocumentId,
    ) -> Result<ExtractedDocument, ClientError> {
        let endpoint = format!("{}/data/{}", self.base_url, document_id);
        debug!(endpoint, "extraction: fetch");
        let response = self.http.get(&endpoint).send().await?;
        if !response.status().is_success() {
            return Err(decode_error_response(response, &endpoint).await);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests;
