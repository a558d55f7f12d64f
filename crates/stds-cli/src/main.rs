//! CLI entry point for the STDS decision engine.
//!
//! Subcommands:
//!   - `train`     - Fit and train on a CSV bar history, print a training report
//!   - `replay`    - Train on a head split, stream the tail through the engine
//!   - `dump-tree` - Train and write the tree snapshot JSON

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, ensure, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use stds_core::bar::Bar;
use stds_core::config::EngineConfig;
use stds_core::decision::Decision;
use stds_core::engine::Engine;
use stds_core::snapshot::TreeSnapshot;
use stds_core::tree::NodeEvent;

const VERSION: &str = "0.1.0";

#[derive(Parser)]
#[command(
    name = "stds",
    version = VERSION,
    about = "Sequential pattern decision engine over OHLCV bars",
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the full bar history and report tree statistics
    Train(TrainArgs),
    /// Train on a head split and replay the tail as a live stream
    Replay(ReplayArgs),
    /// Train and write the tree snapshot JSON
    DumpTree(DumpTreeArgs),
}

#[derive(Parser)]
struct TrainArgs {
    /// Path to the OHLCV CSV file (Date,Open,High,Low,Close,Volume)
    #[arg(long)]
    data: String,

    /// Path to the engine YAML config; defaults apply when omitted
    #[arg(long)]
    config: Option<String>,

    /// Also write the tree snapshot JSON to this file
    #[arg(long)]
    tree_out: Option<PathBuf>,

    /// Print node-creation events as JSON lines while training
    #[arg(long, default_value_t = false)]
    emit_nodes: bool,
}

#[derive(Parser)]
struct ReplayArgs {
    /// Path to the OHLCV CSV file (Date,Open,High,Low,Close,Volume)
    #[arg(long)]
    data: String,

    /// Path to the engine YAML config; defaults apply when omitted
    #[arg(long)]
    config: Option<String>,

    /// Fraction of bars used for training; the rest is streamed
    #[arg(long, default_value_t = 0.8)]
    train_split: f64,
}

#[derive(Parser)]
struct DumpTreeArgs {
    /// Path to the OHLCV CSV file (Date,Open,High,Low,Close,Volume)
    #[arg(long)]
    data: String,

    /// Path to the engine YAML config; defaults apply when omitted
    #[arg(long)]
    config: Option<String>,

    /// Write the snapshot here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct TrainReport {
    bars: usize,
    symbols: usize,
    sequences_inserted: usize,
    node_count: u32,
    config: EngineConfig,
}

#[derive(Serialize)]
struct ReplayTick {
    bar: usize,
    close: f64,
    decision: Decision,
}

#[derive(Serialize, Default)]
struct ReplaySummary {
    streamed: usize,
    buy: usize,
    sell: usize,
    hold: usize,
    none: usize,
}

impl ReplaySummary {
    fn record(&mut self, decision: Decision) {
        self.streamed += 1;
        match decision {
            Decision::Buy => self.buy += 1,
            Decision::Sell => self.sell += 1,
            Decision::Hold => self.hold += 1,
            Decision::None => self.none += 1,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train(args) => cmd_train(args),
        Commands::Replay(args) => cmd_replay(args),
        Commands::DumpTree(args) => cmd_dump_tree(args),
    }
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::from_yaml_file(p),
        None => EngineConfig::default(),
    };
    config
        .validate()
        .map_err(|e| anyhow!("invalid config: {e}"))?;
    Ok(config)
}

fn load_bars(path: &str) -> Result<Vec<Bar>> {
    stds_data::csv_loader::load_bars(path).map_err(|e| anyhow!("failed to load bars: {e}"))
}

fn cmd_train(args: TrainArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bars = load_bars(&args.data)?;

    let mut engine = Engine::new(config.clone());
    if args.emit_nodes {
        engine.set_observer(|event: NodeEvent| {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
        });
    }

    engine.load_bars(bars);
    let sequences_inserted = engine.train();

    let report = TrainReport {
        bars: engine.bars().len(),
        symbols: engine.symbols().len(),
        sequences_inserted,
        node_count: engine.tree().node_count(),
        config,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = args.tree_out {
        let json = engine.tree().to_json()?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write tree snapshot to {}", path.display()))?;
    }
    Ok(())
}

fn cmd_replay(args: ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bars = load_bars(&args.data)?;

    let split = split_index(bars.len(), args.train_split)?;
    let (head, tail) = bars.split_at(split);
    ensure!(!tail.is_empty(), "train split leaves nothing to stream");

    let mut engine = Engine::new(config);
    engine.load_bars(head.to_vec());
    engine.train();
    tracing::info!(trained = head.len(), streaming = tail.len(), "replay split");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut summary = ReplaySummary::default();

    for (offset, bar) in tail.iter().enumerate() {
        let decision = engine.process_new_bar(*bar);
        summary.record(decision);
        let tick = ReplayTick {
            bar: split + offset,
            close: bar.close,
            decision,
        };
        writeln!(out, "{}", serde_json::to_string(&tick)?)?;
    }

    writeln!(out, "{}", serde_json::to_string(&summary)?)?;
    Ok(())
}

fn cmd_dump_tree(args: DumpTreeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let bars = load_bars(&args.data)?;

    let mut engine = Engine::new(config);
    engine.load_bars(bars);
    engine.train();

    let json = TreeSnapshot::capture(engine.tree()).to_json()?;
    match args.output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("cannot write tree snapshot to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Index splitting a series of `len` bars into train head and stream tail.
fn split_index(len: usize, train_split: f64) -> Result<usize> {
    ensure!(
        train_split > 0.0 && train_split < 1.0,
        "train split must be in (0, 1), got {train_split}"
    );
    let split = (len as f64 * train_split) as usize;
    ensure!(split >= 2, "train split leaves too few bars ({split})");
    Ok(split)
}
