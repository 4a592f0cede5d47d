mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use taxograph::EngineConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Taxonomy graph as JSON (`nodes` and `links`).
    #[arg(long)]
    graph: PathBuf,
    /// Engine configuration JSON; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Settle the layout synchronously instead of animating it.
    #[arg(long)]
    static_layout: bool,
    #[arg(long, default_value_t = 300)]
    max_ticks: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taxograph=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let mode = if args.static_layout {
        app::LayoutMode::Static {
            max_ticks: args.max_ticks,
        }
    } else {
        app::LayoutMode::Animated
    };
    info!(graph = %args.graph.display(), ?mode, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "taxograph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::TaxographApp::new(
                cc,
                args.graph.clone(),
                config.clone(),
                mode,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
