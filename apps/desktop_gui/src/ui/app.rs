//! App shell: composes the document selector, the page viewport, and the
//! extracted-data panel. This is also where the selection coordinator
//! lives: `selected_document` has exactly one writer (this struct) and both
//! controllers reload when it changes.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::DocumentId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::table::{EditableField, SortDirection, SortField, TableController};
use crate::controller::viewport::{scale_key, Vec2 as PanVec, ViewportController};

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub backend_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageTextureKey {
    document_id: DocumentId,
    page_number: u32,
    scale_key: u32,
}

enum PageTextureState {
    Pending,
    Ready(egui::TextureHandle),
    Failed(String),
}

const TABLE_COLUMNS: [(SortField, &str); 5] = [
    (SortField::ItemId, "Item"),
    (SortField::Description, "Description"),
    (SortField::Quantity, "Qty"),
    (SortField::UnitPrice, "Unit price"),
    (SortField::TotalPrice, "Total"),
];

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    backend_url: String,
    documents: Vec<DocumentId>,
    documents_loading: bool,
    selected_document: Option<DocumentId>,

    table: TableController,
    viewport: ViewportController,

    page_textures: HashMap<PageTextureKey, PageTextureState>,
    status: String,
    banner: Option<UiError>,
}

impl DesktopGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            backend_url: startup.backend_url,
            documents: Vec::new(),
            documents_loading: false,
            selected_document: None,
            table: TableController::new(),
            viewport: ViewportController::new(),
            page_textures: HashMap::new(),
            status: "Starting backend worker...".to_string(),
            banner: None,
        };
        app.refresh_documents();
        app
    }

    fn refresh_documents(&mut self) {
        self.documents_loading = true;
        dispatch_backend_command(&self.cmd_tx, BackendCommand::ListDocuments, &mut self.status);
    }

    /// The one selection write path. Both controllers reset and reload;
    /// they never hear about each other.
    fn select_document(&mut self, document_id: DocumentId) {
        if self.selected_document.as_ref() == Some(&document_id) {
            return;
        }
        tracing::info!(document = %document_id, "document selected");
        self.selected_document = Some(document_id.clone());
        self.page_textures.clear();

        self.table.begin_load(document_id.clone());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchExtraction {
                document_id: document_id.clone(),
            },
            &mut self.status,
        );

        self.viewport.open(document_id.clone());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::OpenDocument { document_id },
            &mut self.status,
        );
    }

    /// Manual retry for a failed extraction fetch: re-issues the same
    /// request for the same document.
    fn retry_extraction(&mut self) {
        let Some(document_id) = self.table.active_document().cloned() else {
            return;
        };
        self.table.begin_load(document_id.clone());
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchExtraction { document_id },
            &mut self.status,
        );
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(error) => {
                    self.status = format!("{}: {}", error.headline(), error.message());
                    self.banner = Some(error);
                }
                UiEvent::DocumentListLoaded(documents) => {
                    self.documents_loading = false;
                    self.status = format!("{} document(s) available", documents.len());
                    self.documents = documents;
                    self.banner = None;

                    let selection_vanished = self
                        .selected_document
                        .as_ref()
                        .is_some_and(|selected| !self.documents.contains(selected));
                    if selection_vanished {
                        tracing::info!("selected document no longer listed; clearing selection");
                        self.selected_document = None;
                        self.table.clear();
                        self.viewport.clear();
                        self.page_textures.clear();
                    }
                }
                UiEvent::DocumentListFailed(error) => {
                    self.documents_loading = false;
                    self.documents.clear();
                    self.status = "Failed to fetch document list".to_string();
                    self.banner = Some(error);
                }
                UiEvent::ExtractionLoaded {
                    document_id,
                    document,
                } => {
                    self.table.finish_load(&document_id, Ok(document));
                }
                UiEvent::ExtractionFailed { document_id, error } => {
                    self.table.finish_load(&document_id, Err(error));
                }
                UiEvent::PageCountResolved { document_id, count } => {
                    self.viewport.resolve_page_count(&document_id, count);
                }
                UiEvent::DocumentLoadFailed { document_id, error } => {
                    self.viewport.load_failed(&document_id, error);
                }
                UiEvent::PageRendered {
                    document_id,
                    page_number,
                    scale_key,
                    image,
                } => {
                    if self.selected_document.as_ref() != Some(&document_id) {
                        tracing::debug!(
                            document = %document_id,
                            "discarding page raster for superseded selection"
                        );
                        continue;
                    }
                    let key = PageTextureKey {
                        document_id,
                        page_number,
                        scale_key,
                    };
                    let pixels = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width as usize, image.height as usize],
                        &image.rgba,
                    );
                    let handle = ctx.load_texture(
                        format!(
                            "page-{}-{}-{}",
                            key.document_id, key.page_number, key.scale_key
                        ),
                        pixels,
                        egui::TextureOptions::LINEAR,
                    );
                    self.page_textures.insert(key, PageTextureState::Ready(handle));
                }
                UiEvent::PageRenderFailed {
                    document_id,
                    page_number,
                    reason,
                } => {
                    if self.selected_document.as_ref() != Some(&document_id) {
                        continue;
                    }
                    for (key, state) in self.page_textures.iter_mut() {
                        if key.document_id == document_id
                            && key.page_number == page_number
                            && matches!(state, PageTextureState::Pending)
                        {
                            *state = PageTextureState::Failed(reason.clone());
                        }
                    }
                    self.status = format!("Page {page_number} failed to render");
                }
            }
        }
    }

    fn show_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Document Intelligence");
                ui.separator();

                let selected_label = self
                    .selected_document
                    .as_ref()
                    .map(|document| document.to_string())
                    .unwrap_or_else(|| "Select a document".to_string());
                let mut chosen: Option<DocumentId> = None;
                egui::ComboBox::from_id_salt("document-selector")
                    .selected_text(selected_label)
                    .width(260.0)
                    .show_ui(ui, |ui| {
                        for document in &self.documents {
                            let is_selected = self.selected_document.as_ref() == Some(document);
                            if ui.selectable_label(is_selected, document.as_str()).clicked() {
                                chosen = Some(document.clone());
                            }
                        }
                        if self.documents.is_empty() {
                            ui.label("No documents on the backend");
                        }
                    });
                if let Some(document_id) = chosen {
                    self.select_document(document_id);
                }

                if ui
                    .add_enabled(!self.documents_loading, egui::Button::new("Refresh"))
                    .clicked()
                {
                    self.refresh_documents();
                }
                if self.documents_loading {
                    ui.spinner();
                }
            });
            ui.add_space(4.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status-bar").show(ctx, |ui| {
            let mut dismissed = false;
            ui.horizontal(|ui| {
                if let Some(banner) = &self.banner {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        format!("{}: {}", banner.headline(), banner.message()),
                    );
                    if ui.small_button("Dismiss").clicked() {
                        dismissed = true;
                    }
                } else {
                    ui.label(&self.status);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.backend_url);
                });
            });
            if dismissed {
                self.banner = None;
            }
        });
    }

    fn show_viewport_panel(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading("Document");
            if let Some(document_id) = &self.selected_document {
                ui.label(egui::RichText::new(document_id.as_str()).monospace());
            }
        });
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let page_known = self.viewport.page_count().is_some();
            let on_last_page = self
                .viewport
                .page_count()
                .is_some_and(|count| self.viewport.current_page() >= count);

            if ui
                .add_enabled(
                    page_known && self.viewport.current_page() > 1,
                    egui::Button::new("◀"),
                )
                .clicked()
            {
                self.viewport.go_to_page(-1);
            }
            let page_label = match self.viewport.page_count() {
                Some(count) => format!("{} / {count}", self.viewport.current_page()),
                None => "- / -".to_string(),
            };
            ui.label(page_label);
            if ui
                .add_enabled(page_known && !on_last_page, egui::Button::new("▶"))
                .clicked()
            {
                self.viewport.go_to_page(1);
            }

            ui.separator();
            if ui.button("−").clicked() {
                self.viewport.zoom_out();
            }
            ui.label(format!("{:.0}%", self.viewport.zoom() * 100.0));
            if ui.button("+").clicked() {
                self.viewport.zoom_in();
            }
            if ui.button("Reset").clicked() {
                self.viewport.reset_zoom();
            }
        });
        ui.separator();

        if self.selected_document.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label("Select a document from the list to view it here.");
            });
            return;
        }
        if let Some((headline, message)) = self
            .viewport
            .error()
            .map(|error| (error.headline(), error.message().to_string()))
        {
            ui.colored_label(ui.visuals().error_fg_color, headline);
            ui.label(message);
            ui.label("Select the document again to retry.");
            return;
        }
        if self.viewport.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading document...");
            });
            return;
        }

        self.show_page_canvas(ctx, ui);
    }

    fn show_page_canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.viewport.drag_start(PanVec::new(pos.x, pos.y));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.viewport.drag_move(PanVec::new(pos.x, pos.y));
            }
        }
        if response.drag_stopped() {
            self.viewport.drag_end();
        }
        if self.viewport.is_dragging() {
            let pointer_inside = ctx
                .input(|i| i.pointer.latest_pos())
                .is_some_and(|pos| rect.contains(pos));
            if !pointer_inside {
                // Leaving the surface commits exactly like a release.
                self.viewport.drag_end();
            }
        }

        // Transitions snap while dragging so the preview tracks the pointer,
        // and ease otherwise.
        let transform = self.viewport.transform();
        let animation_time = if transform.animate { 0.12 } else { 0.0 };
        let pan_x = ctx.animate_value_with_time(
            egui::Id::new("viewport-pan-x"),
            transform.translation.x,
            animation_time,
        );
        let pan_y = ctx.animate_value_with_time(
            egui::Id::new("viewport-pan-y"),
            transform.translation.y,
            animation_time,
        );
        let display_zoom = ctx.animate_value_with_time(
            egui::Id::new("viewport-zoom"),
            transform.scale,
            animation_time,
        );

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, egui::CornerRadius::ZERO, ui.visuals().extreme_bg_color);

        match self.resolve_page_texture() {
            Some((texture, native_scale)) => {
                let size = texture.size_vec2() * (display_zoom / native_scale);
                let center = rect.center() + egui::vec2(pan_x, pan_y);
                let image_rect = egui::Rect::from_center_size(center, size);
                painter.image(
                    texture.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                let message = match self.current_page_render_failure() {
                    Some(reason) => format!("Page failed to render: {reason}"),
                    None => "Rendering page...".to_string(),
                };
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    message,
                    egui::FontId::proportional(14.0),
                    ui.visuals().text_color(),
                );
            }
        }
    }

    /// Ensures a raster for (document, page, zoom) is requested and returns
    /// the best texture on hand: the exact scale if ready, otherwise the
    /// largest ready raster of the same page, rescaled on screen until the
    /// exact one lands.
    fn resolve_page_texture(&mut self) -> Option<(egui::TextureHandle, f32)> {
        let document_id = self.selected_document.clone()?;
        self.viewport.page_count()?;
        let page_number = self.viewport.current_page();
        let target_key = PageTextureKey {
            document_id: document_id.clone(),
            page_number,
            scale_key: scale_key(self.viewport.zoom()),
        };

        if !self.page_textures.contains_key(&target_key) {
            self.page_textures
                .insert(target_key.clone(), PageTextureState::Pending);
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::RenderPage {
                    document_id: document_id.clone(),
                    page_number,
                    scale: self.viewport.zoom(),
                },
                &mut self.status,
            );
        }

        if let Some(PageTextureState::Ready(handle)) = self.page_textures.get(&target_key) {
            return Some((handle.clone(), target_key.scale_key as f32 / 100.0));
        }

        self.page_textures
            .iter()
            .filter_map(|(key, state)| match state {
                PageTextureState::Ready(handle)
                    if key.document_id == document_id && key.page_number == page_number =>
                {
                    Some((key.scale_key, handle.clone()))
                }
                _ => None,
            })
            .max_by_key(|(key_scale, _)| *key_scale)
            .map(|(key_scale, handle)| (handle, key_scale as f32 / 100.0))
    }

    fn current_page_render_failure(&self) -> Option<&str> {
        let document_id = self.selected_document.as_ref()?;
        let key = PageTextureKey {
            document_id: document_id.clone(),
            page_number: self.viewport.current_page(),
            scale_key: scale_key(self.viewport.zoom()),
        };
        match self.page_textures.get(&key) {
            Some(PageTextureState::Failed(reason)) => Some(reason),
            _ => None,
        }
    }

    fn sort_indicator(&self, field: SortField) -> &'static str {
        if self.table.sort_field() != field {
            return "";
        }
        match self.table.sort_direction() {
            SortDirection::Ascending => " ↑",
            SortDirection::Descending => " ↓",
        }
    }

    fn show_data_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.heading("Extracted data");
        ui.add_space(4.0);

        if self.selected_document.is_none() {
            ui.label("Select a document to start reviewing its extracted line items.");
            return;
        }
        if self.table.is_loading() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Analyzing document structure...");
            });
            return;
        }
        if let Some((headline, message)) = self
            .table
            .error()
            .map(|error| (error.headline(), error.message().to_string()))
        {
            ui.colored_label(ui.visuals().error_fg_color, headline);
            ui.label(message);
            if ui.button("Retry").clicked() {
                self.retry_extraction();
            }
            return;
        }
        let (mut customer_name, mut order_number) = match self.table.document() {
            Some(document) => (
                document.customer_name.clone(),
                document.order_number.clone(),
            ),
            None => return,
        };

        ui.horizontal(|ui| {
            ui.label("Customer");
            if ui.text_edit_singleline(&mut customer_name).changed() {
                self.table
                    .edit_field(EditableField::CustomerName, customer_name.clone());
            }
            ui.label("Order #");
            if ui.text_edit_singleline(&mut order_number).changed() {
                self.table
                    .edit_field(EditableField::OrderNumber, order_number.clone());
            }
        });
        ui.separator();

        let record_count = self.table.record_count();
        let page_count = self.table.page_count();
        let current_page = self.table.current_page();
        let rows: Vec<[String; 5]> = self
            .table
            .visible_slice()
            .iter()
            .map(|record| {
                [
                    record.item_id.clone(),
                    record.description.clone(),
                    record.quantity.clone(),
                    format!("{:.2}", record.unit_price),
                    format!("{:.2}", record.total_price),
                ]
            })
            .collect();

        ui.horizontal(|ui| {
            ui.strong(format!("Records ({record_count})"));
            if page_count > 1 {
                ui.weak(format!("Page {current_page} of {page_count}"));
            }
        });

        let mut sort_clicked: Option<SortField> = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                egui::Grid::new("records-grid")
                    .striped(true)
                    .num_columns(TABLE_COLUMNS.len())
                    .min_col_width(72.0)
                    .show(ui, |ui| {
                        for (field, label) in TABLE_COLUMNS {
                            let text = format!("{label}{}", self.sort_indicator(field));
                            let header =
                                egui::Button::new(egui::RichText::new(text).strong()).frame(false);
                            if ui.add(header).clicked() {
                                sort_clicked = Some(field);
                            }
                        }
                        ui.end_row();

                        if rows.is_empty() {
                            ui.label("No records extracted");
                            ui.end_row();
                        }
                        for row in &rows {
                            for cell in row {
                                ui.label(cell);
                            }
                            ui.end_row();
                        }
                    });
            });
        if let Some(field) = sort_clicked {
            self.table.set_sort_field(field);
        }

        if page_count > 1 {
            let mut page_action: Option<usize> = None;
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(current_page > 1, egui::Button::new("Previous"))
                    .clicked()
                {
                    page_action = Some(current_page - 1);
                }
                for page in 1..=page_count {
                    if ui
                        .selectable_label(page == current_page, page.to_string())
                        .clicked()
                    {
                        page_action = Some(page);
                    }
                }
                if ui
                    .add_enabled(current_page < page_count, egui::Button::new("Next"))
                    .clicked()
                {
                    page_action = Some(current_page + 1);
                }
            });
            if let Some(page) = page_action {
                self.table.set_page(page);
            }
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        self.show_top_panel(ctx);
        self.show_status_bar(ctx);
        egui::SidePanel::left("viewport-panel")
            .resizable(true)
            .default_width(620.0)
            .min_width(360.0)
            .show(ctx, |ui| self.show_viewport_panel(ctx, ui));
        egui::CentralPanel::default().show(ctx, |ui| self.show_data_panel(ui));

        let busy = self.documents_loading
            || self.table.is_loading()
            || self.viewport.is_loading()
            || self.viewport.is_dragging();
        let delay = if busy {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };
        ctx.request_repaint_after(delay);
    }
}
