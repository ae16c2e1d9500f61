mod app;
mod clock;
mod graph;
mod util;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{Session, SessionOptions};
use crate::clock::SystemClock;
use crate::graph::LayoutMode;
use crate::graph::store::{DEFAULT_EXPORT_FILE, DEFAULT_STORAGE_FILE, GraphStore};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Working graph, rewritten after every change.
    #[arg(long, default_value = DEFAULT_STORAGE_FILE)]
    storage: PathBuf,

    /// Destination of "Save to file".
    #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
    export_path: PathBuf,

    /// Replace the stored graph with this document on startup.
    #[arg(long)]
    import: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Planar)]
    mode: LayoutMode,

    /// Initial many-body repulsion strength.
    #[arg(long)]
    repulsion: Option<f32>,

    /// Renumber stored node ids densely from 1, save, and exit.
    #[arg(long)]
    reassign_ids: bool,

    /// Print stored node ids and names, then exit.
    #[arg(long)]
    list_ids: bool,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wild_graph=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_maintenance(args: &Args) -> anyhow::Result<()> {
    let store = GraphStore::new(&args.storage);
    let mut graph = store.load(args.mode);

    if args.reassign_ids {
        graph = graph::reassign_ids(&graph).graph;
        store
            .save(&graph)
            .with_context(|| format!("failed to save {}", args.storage.display()))?;
        println!("reassigned {} node ids in {}", graph.nodes.len(), args.storage.display());
    }

    if args.list_ids {
        for node in &graph.nodes {
            println!("{}\t{}\t{}", node.id, node.name, node.family.join(","));
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.reassign_ids || args.list_ids {
        return run_maintenance(&args);
    }

    let mut session = Session::open(
        SessionOptions {
            storage: args.storage.clone(),
            export_path: args.export_path.clone(),
            mode: args.mode,
            repulsion: args.repulsion,
        },
        Box::new(SystemClock::new()),
    );
    if let Some(path) = &args.import {
        session.import_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "wild-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::WildGraphApp::new(cc, session)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
