use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bubbleshelf::app::{DEFAULT_TOP_N, ViewModel, ViewSettings};
use bubbleshelf::layout::{CanvasConfig, LayoutMode};
use bubbleshelf::library::{ItemId, JsonFileStore, MemoryStore, SessionStore, parse_catalog_str};
use bubbleshelf::util::format_hours;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Lays out a game library as bubbles sized by hours played.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Catalog JSON: an array of games or an object with a `games` array
    catalog: PathBuf,

    /// Session file holding merges, hidden ids and manual items
    #[arg(long)]
    session: Option<PathBuf>,

    #[arg(long, default_value = "packed")]
    mode: LayoutMode,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    #[arg(long, default_value_t = 800.0)]
    height: f32,

    #[arg(long, default_value_t = 16.0)]
    padding: f32,

    /// How many of the heaviest items to lay out (never fewer than 5)
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top: usize,

    #[arg(long)]
    show_all: bool,

    /// Fold one item into another, as FROM:TO
    #[arg(long = "merge", value_parser = parse_merge)]
    merges: Vec<(ItemId, ItemId)>,

    #[arg(long = "unmerge")]
    unmerges: Vec<ItemId>,

    #[arg(long = "hide")]
    hides: Vec<ItemId>,

    #[arg(long = "unhide")]
    unhides: Vec<ItemId>,
}

#[derive(Serialize)]
struct Output<'a> {
    mode: LayoutMode,
    seed: u64,
    nodes: Vec<OutputNode<'a>>,
}

#[derive(Serialize)]
struct OutputNode<'a> {
    id: ItemId,
    name: &'a str,
    hours: f64,
    x: f32,
    y: f32,
    r: f32,
}

fn parse_merge(raw: &str) -> Result<(ItemId, ItemId), String> {
    let (from, to) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got `{raw}`"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<ItemId>()
            .map_err(|error| format!("invalid id `{value}`: {error}"))
    };
    Ok((parse(from)?, parse(to)?))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let raw = fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog {}", args.catalog.display()))?;
    let catalog = parse_catalog_str(&raw)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;

    let store: Box<dyn SessionStore> = match &args.session {
        Some(path) => {
            let store = JsonFileStore::new(path);
            tracing::debug!(path = %store.path().display(), "using session file");
            Box::new(store)
        }
        None => Box::new(MemoryStore::default()),
    };
    let settings = ViewSettings {
        mode: args.mode,
        seed: args.seed,
        top_n: args.top,
        show_all: args.show_all,
        canvas: CanvasConfig {
            width: args.width,
            height: args.height,
            outer_padding: args.padding,
        },
    };
    let mut model = ViewModel::new(catalog, store, settings)?;

    for &(from, to) in &args.merges {
        if let Err(error) = model.add_merge(from, to) {
            tracing::warn!("skipping merge: {error}");
        }
    }
    for &from in &args.unmerges {
        model.remove_merge(from);
    }
    for &id in &args.hides {
        model.hide(id);
    }
    for &id in &args.unhides {
        model.unhide(id);
    }

    while model.processing() {
        model.tick();
    }

    let aggregation = model.aggregation();
    let nodes = model
        .nodes()
        .iter()
        .filter_map(|node| {
            let item = aggregation.canonical().iter().find(|item| item.id == node.id)?;
            Some(OutputNode {
                id: node.id,
                name: &item.name,
                hours: item.weight,
                x: node.x,
                y: node.y,
                r: node.r,
            })
        })
        .collect::<Vec<_>>();

    let total = nodes.iter().map(|node| node.hours).sum::<f64>();
    tracing::info!(
        bubbles = nodes.len(),
        total = %format_hours(total),
        mode = %model.settings().mode,
        "layout ready"
    );

    let output = Output {
        mode: model.settings().mode,
        seed: model.settings().seed,
        nodes,
    };
    let json = serde_json::to_string_pretty(&output).context("failed to encode layout")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    run(Args::parse())
}
