//! Viewport controller: page navigation, zoom, and drag-to-pan composed
//! into one transform for the active document's page surface.

use std::ops::{Add, Sub};

use shared::domain::DocumentId;

use crate::controller::events::UiError;

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.5;
pub const ZOOM_STEP: f32 = 0.2;
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Pointer position or pan translation, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Transform for the page surface: translate by `translation`, then scale by
/// `scale`. `animate` is false while a drag is live so the preview tracks
/// the pointer instantaneously.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    pub translation: Vec2,
    pub scale: f32,
    pub animate: bool,
}

/// Quantizes a zoom scale for cache keys; steps of 0.2 stay distinct.
pub fn scale_key(scale: f32) -> u32 {
    (scale * 100.0).round() as u32
}

pub struct ViewportController {
    active_document: Option<DocumentId>,
    page_count: Option<u32>,
    current_page: u32,
    zoom: f32,
    pan: Vec2,
    committed_pan: Vec2,
    drag_origin: Option<Vec2>,
    error: Option<UiError>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            active_document: None,
            page_count: None,
            current_page: 1,
            zoom: DEFAULT_ZOOM,
            pan: Vec2::ZERO,
            committed_pan: Vec2::ZERO,
            drag_origin: None,
            error: None,
        }
    }

    /// Begins loading a new document. Every piece of view state resets,
    /// including an in-flight drag, regardless of how the previous document
    /// load ended.
    pub fn open(&mut self, document_id: DocumentId) {
        self.active_document = Some(document_id);
        self.page_count = None;
        self.current_page = 1;
        self.zoom = DEFAULT_ZOOM;
        self.pan = Vec2::ZERO;
        self.committed_pan = Vec2::ZERO;
        self.drag_origin = None;
        self.error = None;
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Resolves the page count, once per successful load. A count tagged
    /// with a superseded document is dropped.
    pub fn resolve_page_count(&mut self, document_id: &DocumentId, count: u32) {
        if self.active_document.as_ref() != Some(document_id) {
            tracing::warn!(
                document = %document_id,
                "discarding page count for superseded selection"
            );
            return;
        }
        let count = count.max(1);
        self.page_count = Some(count);
        self.current_page = self.current_page.clamp(1, count);
        self.error = None;
    }

    pub fn load_failed(&mut self, document_id: &DocumentId, error: UiError) {
        if self.active_document.as_ref() != Some(document_id) {
            return;
        }
        self.page_count = None;
        self.error = Some(error);
    }

    /// Relative page navigation; a no-op until the page count is known.
    pub fn go_to_page(&mut self, delta: i32) {
        let Some(count) = self.page_count else {
            return;
        };
        let target = i64::from(self.current_page) + i64::from(delta);
        self.current_page = target.clamp(1, i64::from(count)) as u32;
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Returns the scale to 1.0. Pan is left alone: it is only reachable
    /// through dragging and dragging is disabled at scale <= 1.
    pub fn reset_zoom(&mut self) {
        self.zoom = DEFAULT_ZOOM;
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Drag-start edge of the pan state machine. Gated on zoom: at scale
    /// <= 1 the whole page fits and there is nothing to pan.
    pub fn drag_start(&mut self, pointer: Vec2) {
        if self.zoom <= DEFAULT_ZOOM || self.drag_origin.is_some() {
            return;
        }
        self.drag_origin = Some(pointer);
    }

    /// Live preview while dragging. Recomputed from the fixed origin on
    /// every event, so repeated moves cannot accumulate drift.
    pub fn drag_move(&mut self, pointer: Vec2) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        self.pan = self.committed_pan + (pointer - origin);
    }

    /// Shared exit edge for release and pointer-leave: commits the preview
    /// and returns to idle. A no-op when no drag is live.
    pub fn drag_end(&mut self) {
        if self.drag_origin.take().is_some() {
            self.committed_pan = self.pan;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    pub fn active_document(&self) -> Option<&DocumentId> {
        self.active_document.as_ref()
    }

    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn committed_pan(&self) -> Vec2 {
        self.committed_pan
    }

    pub fn error(&self) -> Option<&UiError> {
        self.error.as_ref()
    }

    /// A document is loading from selection until its page count resolves
    /// or the load fails.
    pub fn is_loading(&self) -> bool {
        self.active_document.is_some() && self.page_count.is_none() && self.error.is_none()
    }

    pub fn transform(&self) -> PageTransform {
        PageTransform {
            translation: self.pan,
            scale: self.zoom,
            animate: !self.is_dragging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::events::{UiError, UiErrorContext};

    fn opened_controller(id: &str, pages: u32) -> ViewportController {
        let document_id = DocumentId::from(id);
        let mut controller = ViewportController::new();
        controller.open(document_id.clone());
        controller.resolve_page_count(&document_id, pages);
        controller
    }

    fn load_error() -> UiError {
        UiError::from_message(UiErrorContext::LoadDocument, "renderer offline")
    }

    #[test]
    fn drag_start_is_gated_until_zoomed_in() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.drag_start(Vec2::new(10.0, 10.0));
        assert!(!controller.is_dragging());
        controller.drag_move(Vec2::new(30.0, 10.0));
        assert_eq!(controller.pan(), Vec2::ZERO);

        controller.zoom_in();
        controller.drag_start(Vec2::new(10.0, 10.0));
        assert!(controller.is_dragging());
    }

    #[test]
    fn drag_commit_matches_pointer_travel() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();

        controller.drag_start(Vec2::new(10.0, 10.0));
        controller.drag_move(Vec2::new(30.0, 10.0));
        controller.drag_end();

        assert_eq!(controller.pan(), Vec2::new(20.0, 0.0));
        assert_eq!(controller.committed_pan(), Vec2::new(20.0, 0.0));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn moves_recompute_from_origin_instead_of_accumulating() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();

        controller.drag_start(Vec2::new(10.0, 10.0));
        controller.drag_move(Vec2::new(20.0, 10.0));
        controller.drag_move(Vec2::new(20.0, 10.0));
        controller.drag_move(Vec2::new(30.0, 10.0));
        assert_eq!(controller.pan(), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn second_drag_continues_from_committed_offset() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();

        controller.drag_start(Vec2::new(0.0, 0.0));
        controller.drag_move(Vec2::new(15.0, 5.0));
        // Pointer left the surface: treated exactly like a release.
        controller.drag_end();

        controller.drag_start(Vec2::new(100.0, 100.0));
        controller.drag_move(Vec2::new(110.0, 100.0));
        controller.drag_end();
        assert_eq!(controller.committed_pan(), Vec2::new(25.0, 5.0));
    }

    #[test]
    fn release_and_move_while_idle_are_no_ops() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();
        controller.drag_move(Vec2::new(50.0, 50.0));
        controller.drag_end();
        assert_eq!(controller.pan(), Vec2::ZERO);
        assert_eq!(controller.committed_pan(), Vec2::ZERO);
    }

    #[test]
    fn drag_start_while_dragging_keeps_the_original_origin() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();
        controller.drag_start(Vec2::new(10.0, 10.0));
        controller.drag_start(Vec2::new(90.0, 90.0));
        controller.drag_move(Vec2::new(30.0, 10.0));
        assert_eq!(controller.pan(), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn twenty_zoom_steps_stop_at_the_upper_bound() {
        let mut controller = opened_controller("a.pdf", 3);
        for _ in 0..20 {
            controller.zoom_in();
        }
        assert_eq!(controller.zoom(), MAX_ZOOM);

        for _ in 0..20 {
            controller.zoom_out();
        }
        assert_eq!(controller.zoom(), MIN_ZOOM);
    }

    #[test]
    fn reset_zoom_returns_scale_without_touching_pan() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();
        controller.drag_start(Vec2::new(0.0, 0.0));
        controller.drag_move(Vec2::new(12.0, 8.0));
        controller.drag_end();

        controller.reset_zoom();
        assert_eq!(controller.zoom(), DEFAULT_ZOOM);
        assert_eq!(controller.committed_pan(), Vec2::new(12.0, 8.0));
        // Back at scale 1, dragging is gated again.
        controller.drag_start(Vec2::new(0.0, 0.0));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn page_navigation_clamps_and_needs_a_resolved_count() {
        let document_id = DocumentId::from("a.pdf");
        let mut controller = ViewportController::new();
        controller.open(document_id.clone());

        controller.go_to_page(1);
        assert_eq!(controller.current_page(), 1);

        controller.resolve_page_count(&document_id, 3);
        controller.go_to_page(5);
        assert_eq!(controller.current_page(), 3);
        controller.go_to_page(-1);
        assert_eq!(controller.current_page(), 2);
        controller.go_to_page(-10);
        assert_eq!(controller.current_page(), 1);
    }

    #[test]
    fn late_page_count_for_superseded_document_is_discarded() {
        let first = DocumentId::from("a.pdf");
        let second = DocumentId::from("b.pdf");
        let mut controller = ViewportController::new();

        controller.open(first.clone());
        controller.open(second.clone());
        assert_eq!(controller.active_document(), Some(&second));
        controller.resolve_page_count(&first, 9);
        assert!(controller.is_loading());
        assert_eq!(controller.page_count(), None);

        controller.resolve_page_count(&second, 2);
        assert_eq!(controller.page_count(), Some(2));
    }

    #[test]
    fn a_shrinking_page_count_pulls_the_current_page_back_in_range() {
        let document_id = DocumentId::from("a.pdf");
        let mut controller = ViewportController::new();
        controller.open(document_id.clone());
        controller.resolve_page_count(&document_id, 10);
        controller.go_to_page(9);
        assert_eq!(controller.current_page(), 10);

        controller.resolve_page_count(&document_id, 4);
        assert_eq!(controller.current_page(), 4);
    }

    #[test]
    fn selecting_a_new_document_mid_drag_forces_idle() {
        let mut controller = opened_controller("a.pdf", 3);
        controller.zoom_in();
        controller.drag_start(Vec2::new(0.0, 0.0));
        controller.drag_move(Vec2::new(40.0, 40.0));

        controller.open(DocumentId::from("b.pdf"));
        assert!(!controller.is_dragging());
        assert_eq!(controller.pan(), Vec2::ZERO);
        assert_eq!(controller.committed_pan(), Vec2::ZERO);
        assert_eq!(controller.zoom(), DEFAULT_ZOOM);
        assert_eq!(controller.current_page(), 1);
    }

    #[test]
    fn load_failure_is_explicit_state_and_cleared_by_reopening() {
        let document_id = DocumentId::from("a.pdf");
        let mut controller = ViewportController::new();
        controller.open(document_id.clone());
        controller.load_failed(&document_id, load_error());

        assert!(controller.error().is_some());
        assert!(!controller.is_loading());
        assert_eq!(controller.page_count(), None);

        controller.open(document_id);
        assert!(controller.error().is_none());
        assert!(controller.is_loading());
    }

    #[test]
    fn transform_suppresses_animation_only_while_dragging() {
        let mut controller = opened_controller("a.pdf", 3);
        assert!(controller.transform().animate);

        controller.zoom_in();
        controller.drag_start(Vec2::new(0.0, 0.0));
        controller.drag_move(Vec2::new(5.0, 5.0));
        let live = controller.transform();
        assert!(!live.animate);
        assert_eq!(live.translation, Vec2::new(5.0, 5.0));

        controller.drag_end();
        assert!(controller.transform().animate);
    }

    #[test]
    fn zoom_scale_keys_stay_distinct_per_step() {
        assert_eq!(scale_key(1.0), 100);
        assert_eq!(scale_key(1.2), 120);
        let mut zoom = DEFAULT_ZOOM;
        let mut keys = vec![scale_key(zoom)];
        for _ in 0..7 {
            zoom = (zoom + ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
            keys.push(scale_key(zoom));
        }
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }
}
