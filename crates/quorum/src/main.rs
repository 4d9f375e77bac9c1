use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quorum::agents::ModelRegistry;
use quorum::feed::DirectoryFeed;
use quorum::models::{MarketSnapshot, QuorumConfig};
use quorum::scheduler::Scheduler;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quorum", about = "Multi-agent consensus for trade signals")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/quorum.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one consensus cycle for a market snapshot and print the decision
    Evaluate {
        /// Read MarketSnapshot JSON from a file instead of stdin
        #[arg(short, long)]
        input: Option<String>,

        /// News headline to use instead of the configured feed (repeatable)
        #[arg(long)]
        news: Vec<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Poll snapshots, publish confirmed signals to stdout, accept commands on stdin
    Run,
    /// Show the role assignments and the selectable models
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = quorum::load_config(&cli.config)?;

    match cli.command {
        Command::Evaluate {
            input,
            news,
            pretty,
        } => evaluate(&config, input.as_deref(), news, pretty).await,
        Command::Run => run(config).await,
        Command::Models => models(&config),
    }
}

async fn evaluate(
    config: &QuorumConfig,
    input: Option<&str>,
    news: Vec<String>,
    pretty: bool,
) -> Result<()> {
    let snapshot_json = if let Some(input_path) = input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {input_path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };
    let snapshot: MarketSnapshot =
        serde_json::from_str(&snapshot_json).context("Failed to parse MarketSnapshot JSON")?;

    let mut synthesizer =
        quorum::build_synthesizer(config).context("Failed to build synthesizer")?;
    let news = (!news.is_empty()).then_some(news);
    let decision = synthesizer
        .get_consensus(&snapshot.symbol, &snapshot, news)
        .await;

    let output = if pretty {
        serde_json::to_string_pretty(&decision)?
    } else {
        serde_json::to_string(&decision)?
    };
    println!("{output}");
    Ok(())
}

async fn run(config: QuorumConfig) -> Result<()> {
    let synthesizer = quorum::build_synthesizer(&config).context("Failed to build synthesizer")?;
    let registry = synthesizer.registry().clone();
    let feed = Arc::new(DirectoryFeed::new(&config.scheduler.snapshot_dir));
    let mut scheduler = Scheduler::new(synthesizer, feed, config.scheduler.clone());
    let cancel = scheduler.cancel_token();

    // Handle shutdown signals
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
            cancel.cancel();
        });
    }

    let (tx, mut rx) = mpsc::channel(64);
    let publish = async {
        while let Some(signal) = rx.recv().await {
            match serde_json::to_string(&signal) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(error = %e, "Failed to serialize signal"),
            }
        }
    };

    let commands = quorum::commands::serve(
        &registry,
        quorum::commands::spawn_stdin_reader(),
        &cancel,
        |response| println!("{response}"),
    );

    tokio::join!(scheduler.run(tx), publish, commands);
    Ok(())
}

fn models(config: &QuorumConfig) -> Result<()> {
    let gateway = quorum::build_gateway(config)?;
    let registry = ModelRegistry::from_config(config, Arc::clone(&gateway));
    let report = serde_json::json!({
        "models": registry.snapshot(),
        "available": registry.list_available(),
        "uncredentialed": gateway.uncredentialed().collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
