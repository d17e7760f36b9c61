mod app;
mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracescope_core::views::render_timeline;
use tracescope_core::{TimeWindow, TraceModel, ViewerConfig, svg};
use tracescope_protocol::Viewport;
use tracing_subscriber::EnvFilter;

/// Terminal flame-graph viewer for Chrome trace event files.
#[derive(Parser, Debug)]
#[command(name = "tracescope", version)]
struct Args {
    /// Trace file (JSON array or object with `traceEvents`).
    trace: PathBuf,

    /// Viewer config JSON; navigation settings apply in the terminal, layout
    /// settings apply to SVG export.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs here. The interactive view never logs to the terminal.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render the whole trace to this SVG file and exit.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// SVG width in pixels.
    #[arg(long, default_value_t = 1600.0)]
    width: f64,

    /// SVG height in pixels; defaults to the height of all tracks.
    #[arg(long)]
    height: Option<f64>,

    /// Use the light palette for SVG export.
    #[arg(long)]
    light: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.svg.is_some())?;

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    let data = std::fs::read(&args.trace)
        .with_context(|| format!("reading {}", args.trace.display()))?;
    let model = tracescope_core::ingest_slice(&data)
        .with_context(|| format!("loading {}", args.trace.display()))?;

    if let Some(out) = &args.svg {
        return export_svg(&model, &config, &args, out);
    }

    let source = args
        .trace
        .file_name()
        .map_or_else(|| args.trace.display().to_string(), |n| n.to_string_lossy().into_owned());
    app::run(app::Viewer::new(model, source, config.navigation))
}

fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn export_svg(model: &TraceModel, config: &ViewerConfig, args: &Args, out: &Path) -> Result<()> {
    let layout = config.layout;
    let height = args
        .height
        .unwrap_or_else(|| layout.content_height(model).max(100.0) + 30.0);
    let viewport = Viewport::new(args.width, height);
    let commands = render_timeline(model, &TimeWindow::full(model), &viewport, &layout, None);
    let document = svg::render_svg(&commands, args.width, height, !args.light);

    std::fs::write(out, document).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(
        path = %out.display(),
        width = args.width,
        height,
        commands = commands.len(),
        "exported svg"
    );
    Ok(())
}
