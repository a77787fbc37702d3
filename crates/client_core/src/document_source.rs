//! Document source collaborator: page-count discovery and per-page rasters.

use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::DocumentId, protocol::DocumentInfo};
use tracing::debug;

use crate::{decode_error_response, normalize_base_url, ClientError};

/// One rendered page, as encoded image bytes (PNG or JPEG) at the requested
/// scale. Decoding is the caller's concern.
#[derive(Debug, Clone)]
pub struct PageRaster {
    pub page_number: u32,
    pub bytes: Vec<u8>,
}

/// Renderable-page provider for one backend. Page count resolves
/// asynchronously after a document is first opened; render failures are a
/// single opaque load-error signal per call.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn page_count(&self, document_id: &DocumentId) -> Result<u32, ClientError>;

    /// Renders one page at a positive real scale factor. `page_number` is
    /// 1-based, matching what the viewport displays.
    async fn render_page(
        &self,
        document_id: &DocumentId,
        page_number: u32,
        scale: f32,
    ) -> Result<PageRaster, ClientError>;
}

pub struct HttpDocumentSource {
    http: Client,
    base_url: String,
}

impl HttpDocumentSource {
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
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn page_count(&self, document_id: &DocumentId) -> Result<u32, ClientError> {
        let endpoint = format!("{}/pdf/{}/info", self.base_url, document_id);
        debug!(endpoint, "document source: page count");
        let response = self.http.get(&endpoint).send().await?;
        if !response.status().is_success() {
            return Err(decode_error_response(response, &endpoint).await);
        }
        let info: DocumentInfo = response.json().await?;
        Ok(info.page_count)
    }

    async fn render_page(
        &self,
        document_id: &DocumentId,
        page_number: u32,
        scale: f32,
    ) -> Result<PageRaster, ClientError> {
        debug_assert!(scale > 0.0, "render scale must be positive");
        let endpoint = format!(
            "{}/pdf/{}/page/{}",
            self.base_url, document_id, page_number
        );
        debug!(endpoint, scale, "document source: render page");
        let response = self
            .http
            .get(&endpoint)
            .query(&[("scale", scale)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(decode_error_response(response, &endpoint).await);
        }
        let bytes = response.bytes().await?;
        Ok(PageRaster {
            page_number,
            bytes: bytes.to_vec(),
        })
    }
}
