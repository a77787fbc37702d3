use serde::{Deserialize, Serialize};

use crate::domain::DocumentId;

/// One extracted line item. Immutable once fetched; `quantity` is kept as
/// opaque text because source values are not guaranteed numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Extraction result for one document. `records` stays in fetch order;
/// display order is always derived, never written back here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExtractedDocument {
    pub customer_name: String,
    pub order_number: String,
    #[serde(default)]
    pub records: Vec<LineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListing {
    #[serde(default)]
    pub documents: Vec<DocumentId>,
}

/// Resolved once per successful document load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: u32,
}
