//! Tabular view controller: sorting, pagination, and scalar edits over one
//! document's extracted line items.
//!
//! The record set is owned verbatim in fetch order; the visible window is
//! derived from raw state on every read instead of keeping a sorted copy
//! around to invalidate.

use std::cmp::Ordering;

use shared::{
    domain::DocumentId,
    protocol::{ExtractedDocument, LineItem},
};

use crate::controller::events::UiError;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ItemId,
    Description,
    Quantity,
    UnitPrice,
    TotalPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The two document-level scalars the user may correct in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    CustomerName,
    OrderNumber,
}

pub struct TableController {
    active_document: Option<DocumentId>,
    document: Option<ExtractedDocument>,
    loading: bool,
    error: Option<UiError>,
    sort_field: SortField,
    sort_direction: SortDirection,
    current_page: usize,
}

impl Default for TableController {
    fn default() -> Self {
        Self::new()
    }
}

impl TableController {
    pub fn new() -> Self {
        Self {
            active_document: None,
            document: None,
            loading: false,
            error: None,
            sort_field: SortField::ItemId,
            sort_direction: SortDirection::Ascending,
            current_page: 1,
        }
    }

    /// Starts a fetch for `document_id`. Prior data is cleared up front so a
    /// loading indicator is never shown next to stale rows.
    pub fn begin_load(&mut self, document_id: DocumentId) {
        self.active_document = Some(document_id);
        self.document = None;
        self.loading = true;
        self.error = None;
        self.current_page = 1;
    }

    /// Commits or discards one fetch result. A response tagged with anything
    /// other than the active document is dropped: latest selection wins.
    pub fn finish_load(
        &mut self,
        document_id: &DocumentId,
        result: Result<ExtractedDocument, UiError>,
    ) {
        if self.active_document.as_ref() != Some(document_id) {
            tracing::warn!(
                document = %document_id,
                "discarding extraction response for superseded selection"
            );
            return;
        }
        self.loading = false;
        match result {
            Ok(document) => {
                self.document = Some(document);
                self.error = None;
                self.current_page = 1;
            }
            Err(error) => {
                self.document = None;
                self.error = Some(error);
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Clicking the active column flips direction; any other column becomes
    /// the key and starts ascending. Either way the old page is meaningless,
    /// so the view returns to page 1.
    pub fn set_sort_field(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Ascending;
        }
        self.current_page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.page_count());
    }

    /// Edits the in-memory document only; persistence is a collaborator
    /// concern outside this controller.
    pub fn edit_field(&mut self, field: EditableField, value: String) {
        if let Some(document) = self.document.as_mut() {
            match field {
                EditableField::CustomerName => document.customer_name = value,
                EditableField::OrderNumber => document.order_number = value,
            }
        }
    }

    pub fn active_document(&self) -> Option<&DocumentId> {
        self.active_document.as_ref()
    }

    pub fn document(&self) -> Option<&ExtractedDocument> {
        self.document.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&UiError> {
        self.error.as_ref()
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn record_count(&self) -> usize {
        self.document
            .as_ref()
            .map(|document| document.records.len())
            .unwrap_or(0)
    }

    /// An empty record set is a valid zero-row table with one page.
    pub fn page_count(&self) -> usize {
        self.record_count().div_ceil(PAGE_SIZE).max(1)
    }

    /// Derives the visible window on every call: stable sort over the full
    /// record set, then the current page's slice clipped to record bounds.
    pub fn visible_slice(&self) -> Vec<&LineItem> {
        let Some(document) = self.document.as_ref() else {
            return Vec::new();
        };
        let mut ordered: Vec<&LineItem> = document.records.iter().collect();
        ordered.sort_by(|a, b| {
            let ordering = compare_by_field(a, b, self.sort_field);
            match self.sort_direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        let start = (self.current_page - 1) * PAGE_SIZE;
        ordered.into_iter().skip(start).take(PAGE_SIZE).collect()
    }
}

fn compare_by_field(a: &LineItem, b: &LineItem, field: SortField) -> Ordering {
    match field {
        SortField::ItemId => collate(&a.item_id, &b.item_id),
        SortField::Description => collate(&a.description, &b.description),
        // Quantity is opaque text, so it orders as text ("10" < "9").
        SortField::Quantity => collate(&a.quantity, &b.quantity),
        // NaN pairs fall back to Equal so ordering degrades to fetch order.
        SortField::UnitPrice => a
            .unit_price
            .partial_cmp(&b.unit_price)
            .unwrap_or(Ordering::Equal),
        SortField::TotalPrice => a
            .total_price
            .partial_cmp(&b.total_price)
            .unwrap_or(Ordering::Equal),
    }
}

/// Case-insensitive text ordering with codepoint order as the secondary
/// key, so strings that differ only in case still order deterministically.
fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}
