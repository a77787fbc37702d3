use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{DesktopGuiApp, StartupConfig};

/// Desktop review tool for uploaded documents and their extracted line items.
#[derive(Parser, Debug)]
#[command(name = "docintel-desktop", version, about)]
struct Cli {
    /// Base URL of the extraction backend.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    backend_url: String,
}

/// Environment beats the CLI default so packaged launches can be pointed at
/// another backend without editing shortcuts.
fn resolve_backend_url(cli_value: String) -> String {
    match std::env::var("DOCINTEL__BACKEND_URL") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => cli_value,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let backend_url = resolve_backend_url(cli.backend_url);
    tracing::info!(backend_url, "starting desktop app");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(backend_url.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Document Intelligence")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([980.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Document Intelligence",
        options,
        Box::new(|_cc| {
            Ok(Box::new(DesktopGuiApp::bootstrap(
                cmd_tx,
                ui_rx,
                StartupConfig { backend_url },
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to run desktop app: {err}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::resolve_backend_url;

    #[test]
    fn environment_override_wins_when_set_and_non_empty() {
        std::env::set_var("DOCINTEL__BACKEND_URL", "http://10.0.0.2:8000");
        assert_eq!(
            resolve_backend_url("http://127.0.0.1:8000".to_string()),
            "http://10.0.0.2:8000"
        );
        std::env::set_var("DOCINTEL__BACKEND_URL", "  ");
        assert_eq!(
            resolve_backend_url("http://127.0.0.1:8000".to_string()),
            "http://127.0.0.1:8000"
        );
        std::env::remove_var("DOCINTEL__BACKEND_URL");
        assert_eq!(
            resolve_backend_url("http://127.0.0.1:8000".to_string()),
            "http://127.0.0.1:8000"
        );
    }
}
