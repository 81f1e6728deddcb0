mod app;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use graph_lens::{Engine, EngineConfig, GraphPayload, LayoutMode};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph JSON file with `nodes` and `edges` arrays.
    graph: PathBuf,
    /// Initial layout; defaults to the file's `layout_hint`, then the config.
    #[arg(long, value_enum)]
    layout: Option<LayoutMode>,
    /// Engine configuration as JSON.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    no_tooltips: bool,
}

pub(crate) fn read_payload(path: &Path) -> Result<GraphPayload> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph {}", path.display()))?;
    GraphPayload::from_json(&text)
        .with_context(|| format!("failed to parse graph {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("graph_lens=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.no_tooltips {
        config.interaction.tooltips = false;
    }

    let payload = read_payload(&args.graph)?;
    if let Some(layout) = args.layout.or(payload.layout_hint) {
        config.layout = layout;
    }

    let mut engine = Engine::new(config).context("invalid engine configuration")?;
    engine
        .load(payload)
        .with_context(|| format!("failed to load graph {}", args.graph.display()))?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    let graph_path = args.graph;
    eframe::run_native(
        "graph-lens",
        options,
        Box::new(move |_cc| Ok(Box::new(app::GraphLensApp::new(engine, graph_path)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
