//! Native entry point for the egui viewer.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;
    use tracescope_core::ViewerConfig;
    use tracescope_ui::TraceApp;
    use tracing_subscriber::EnvFilter;

    #[derive(Parser)]
    #[command(name = "tracescope-viewer", about = "Interactive flame-graph viewer for Chrome traces")]
    struct Args {
        /// Trace file to open on startup.
        trace: Option<PathBuf>,
        /// JSON viewer config (layout and navigation tuning).
        #[arg(long)]
        config: Option<PathBuf>,
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("tracescope")
            .with_inner_size([1280.0, 800.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "tracescope",
        options,
        Box::new(move |cc| {
            let mut app = TraceApp::new(cc, config);
            if let Some(path) = args.trace {
                app.open_path(&cc.egui_ctx, path);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with an error: {e}"))
}

#[cfg(target_arch = "wasm32")]
fn main() {}
