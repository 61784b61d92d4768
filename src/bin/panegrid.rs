use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use panegrid::common::config::{self, Config};
use panegrid::common::log;
use panegrid::packer::{PackOptions, Size, pack};
use panegrid::storage::SpatialStore;
use panegrid::storage::fs::FileStore;

#[derive(Parser)]
struct Cli {
    /// Path to the config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory of the chunk store.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that every persisted chunk record parses, without starting
    /// anything.
    Validate,

    /// List persisted chunks with their pane counts.
    List,

    /// Run the packer over a JSON file mapping pane ids to [width, height]
    /// and print the placements.
    Pack {
        sizes: PathBuf,

        /// Container width; defaults to the configured chunk width.
        #[arg(long)]
        width: Option<f64>,

        /// Container height; defaults to the configured chunk height.
        #[arg(long)]
        height: Option<f64>,
    },
}

fn main() {
    log::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::config_file);
    let config = match Config::read_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to read config {:?}: {e:#}", config_path);
            process::exit(1);
        }
    };
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {issue}");
        }
        process::exit(1);
    }

    let store_root = cli.store.clone().unwrap_or_else(config::chunk_store_dir);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Command::Validate => validate(&store_root).await,
            Command::List => list(&store_root).await,
            Command::Pack { sizes, width, height } => {
                let container = Size::new(
                    width.unwrap_or(f64::from(config.chunk.width)),
                    height.unwrap_or(f64::from(config.chunk.height)),
                );
                pack_file(&sizes, container, &config.packing)
            }
        }
    });

    if let Err(e) = result {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

async fn validate(store_root: &Path) -> anyhow::Result<()> {
    let store = FileStore::new(store_root);
    let records = store.list_all_chunks().await.context("reading chunk store")?;
    for record in &records {
        for pane in &record.panes {
            if pane.chunk_coords != record.coord {
                println!(
                    "warning: pane {} in chunk {} records owner {}",
                    pane.id.as_str(),
                    record.coord,
                    pane.chunk_coords
                );
            }
        }
    }
    println!("{} chunk record(s) ok in {:?}", records.len(), store_root);
    Ok(())
}

async fn list(store_root: &Path) -> anyhow::Result<()> {
    let store = FileStore::new(store_root);
    let records = store.list_all_chunks().await.context("reading chunk store")?;
    if records.is_empty() {
        println!("no persisted chunks in {:?}", store_root);
        return Ok(());
    }
    for record in records {
        println!(
            "{:>12}  id={}  panes={}  loaded={}",
            record.coord.storage_key(),
            record.id.as_str(),
            record.panes.len(),
            record.loaded
        );
    }
    Ok(())
}

fn pack_file(sizes: &Path, container: Size, options: &PackOptions) -> anyhow::Result<()> {
    let buf = std::fs::read_to_string(sizes).with_context(|| format!("reading {:?}", sizes))?;
    let table: HashMap<String, (f64, f64)> =
        serde_json::from_str(&buf).context("parsing size table")?;

    let mut ids: Vec<String> = table.keys().cloned().collect();
    ids.sort();

    let result = pack(
        &ids,
        container,
        |id| table.get(id).map(|&(w, h)| Size::new(w, h)),
        options,
    );

    for p in &result.placements {
        println!("{:>20}  x={:8.1}  y={:8.1}  w={:7.1}  h={:7.1}", p.item, p.x, p.y, p.width, p.height);
    }
    println!(
        "all_fit={}  utilization={:.3}  ({} item(s) in {}x{})",
        result.all_fit,
        result.utilization,
        result.placements.len(),
        container.width,
        container.height
    );
    Ok(())
}
