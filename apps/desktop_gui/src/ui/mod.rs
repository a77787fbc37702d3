//! UI layer for the desktop app: shell, panels, and page-texture plumbing.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
