//! Backend commands queued from UI to backend worker.

use shared::domain::DocumentId;

pub enum BackendCommand {
    ListDocuments,
    FetchExtraction {
        document_id: DocumentId,
    },
    OpenDocument {
        document_id: DocumentId,
    },
    RenderPage {
        document_id: DocumentId,
        page_number: u32,
        scale: f32,
    },
}
