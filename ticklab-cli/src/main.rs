//! Replay a scripted tick tape through the backtest engine from the command
//! line.

mod strategy;
mod tape;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use ticklab_core::fingerprint::{fingerprint, state_json, StateDump};
use ticklab_core::{AlgoContainer, Command, LoggingConsumer, MatchingBook, Sequencer};

use strategy::{VwapConfig, VwapStrategy};

#[derive(Parser)]
#[command(name = "ticklab", version, about = "Deterministic trading backtest replays")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the scripted tape with the VWAP strategy.
    Replay {
        /// Strategy config as TOML; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full final-state dump as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the scripted tape without running it.
    ShowTape,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { config, json } => replay(config, json),
        Commands::ShowTape => {
            for (i, message) in tape::standard_tape().iter().enumerate() {
                println!("{:>3}  {message}", i + 1);
            }
            Ok(())
        }
    }
}

fn replay(config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => VwapConfig::default(),
    };

    let book = Rc::new(RefCell::new(MatchingBook::new()));
    let container = Rc::new(RefCell::new(AlgoContainer::new(Box::new(
        VwapStrategy::new(config),
    ))));

    let mut sequencer = Sequencer::new();
    sequencer.register(Box::new(LoggingConsumer::new()))?;
    sequencer.register(Box::new(Rc::clone(&book)))?;
    sequencer.register(Box::new(Rc::clone(&container)))?;

    let ticks = tape::standard_tape();
    let tick_count = ticks.len();
    for message in &ticks {
        sequencer.submit(Command::from_message(message))?;
    }

    let book_ref = book.borrow();
    let container_ref = container.borrow();
    let dump = StateDump {
        last_seq: sequencer.last_seq(),
        book: &*book_ref,
        market: container_ref.market(),
        orders: container_ref.orders(),
    };

    println!(
        "replayed {} commands across {} ticks",
        sequencer.last_seq(),
        tick_count
    );
    for order in container_ref.orders().all_orders() {
        println!(
            "  #{} {:?} {} @ {}  filled {}  {:?}",
            order.id, order.side, order.quantity, order.price, order.filled_quantity, order.state
        );
    }
    println!(
        "total filled quantity: {}",
        container_ref.orders().total_filled_quantity()
    );
    println!("state fingerprint: {}", fingerprint(&dump)?);

    if json {
        println!("{}", state_json(&dump)?);
    }
    Ok(())
}
