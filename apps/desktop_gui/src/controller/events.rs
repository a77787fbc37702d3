//! UI/backend events and error modeling for the desktop controllers.

use client_core::ClientError;
use shared::{
    domain::DocumentId,
    error::ErrorCode,
    protocol::ExtractedDocument,
};

/// Decoded RGBA pixels for one rendered page, ready for texture upload.
#[derive(Clone)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub enum UiEvent {
    Info(String),
    Error(UiError),
    DocumentListLoaded(Vec<DocumentId>),
    DocumentListFailed(UiError),
    ExtractionLoaded {
        document_id: DocumentId,
        document: ExtractedDocument,
    },
    ExtractionFailed {
        document_id: DocumentId,
        error: UiError,
    },
    PageCountResolved {
        document_id: DocumentId,
        count: u32,
    },
    DocumentLoadFailed {
        document_id: DocumentId,
        error: UiError,
    },
    PageRendered {
        document_id: DocumentId,
        page_number: u32,
        scale_key: u32,
        image: PageImage,
    },
    PageRenderFailed {
        document_id: DocumentId,
        page_number: u32,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    NotFound,
    Backend,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    ListDocuments,
    FetchExtraction,
    LoadDocument,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// Classifies a typed client failure. Transport problems are worth
    /// calling out separately in the UI since retrying them is most likely
    /// to help.
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport(_) => UiErrorCategory::Transport,
            ClientError::Api(api) if api.code == ErrorCode::NotFound => UiErrorCategory::NotFound,
            ClientError::Api(_) | ClientError::UnexpectedStatus { .. } => UiErrorCategory::Backend,
            ClientError::InvalidBaseUrl { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Short label for the error banner.
    pub fn headline(&self) -> &'static str {
        match self.category {
            UiErrorCategory::Transport => "Backend unreachable",
            UiErrorCategory::NotFound => "Not found",
            UiErrorCategory::Backend => "Backend error",
            UiErrorCategory::Unknown => "Unexpected error",
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use shared::error::ApiError;

    use super::*;

    #[test]
    fn classifies_missing_extraction_as_not_found() {
        let err = ClientError::Api(ApiError::new(ErrorCode::NotFound, "no extraction stored"));
        let ui = UiError::from_client_error(UiErrorContext::FetchExtraction, &err);
        assert_eq!(ui.category(), UiErrorCategory::NotFound);
        assert_eq!(ui.context(), UiErrorContext::FetchExtraction);
        assert!(ui.message().contains("no extraction stored"));
    }

    #[test]
    fn classifies_unexpected_status_as_backend_error() {
        let err = ClientError::UnexpectedStatus {
            status: StatusCode::BAD_GATEWAY,
            endpoint: "http://127.0.0.1:8000/data/x".to_string(),
        };
        let ui = UiError::from_client_error(UiErrorContext::FetchExtraction, &err);
        assert_eq!(ui.category(), UiErrorCategory::Backend);
        assert_eq!(ui.headline(), "Backend error");
    }

    #[test]
    fn free_form_messages_default_to_unknown() {
        let ui = UiError::from_message(UiErrorContext::BackendStartup, "runtime build failed");
        assert_eq!(ui.category(), UiErrorCategory::Unknown);
    }
}
