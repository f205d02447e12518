//! # Ledger Ingest
//!
//! Entry point: logging, configuration, Ctrl+C handling and subcommand
//! dispatch.
//!
//! ## Usage
//!
//! ```bash
//! # Ingest an exporter dump
//! ledger-ingest sync --export-dir ./export --data-dir ./data/ledger
//!
//! # Synthetic ledger, 20k blocks, small pages
//! LI_SOURCE=synthetic ledger-ingest sync --to-block 19999 --page-size 250
//!
//! # Check the result
//! ledger-ingest validate
//! ledger-ingest status
//! ```
//!
//! `RUST_LOG` controls verbosity (default `info`).

use anyhow::{Context, Result};
use clap::Parser;
use ingest_runtime::cli::{Cli, Command};
use ingest_runtime::commands;
use ingest_runtime::container::{IngestConfig, PipelineContext};
use li_03_page_sync::SyncOutcome;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("installing tracing subscriber")?;

    let config = cli.resolve_config().context("loading configuration")?;

    let result = match cli.command {
        Command::Sync(args) => run_sync(config, args.to_block).await,
        Command::Validate { from_block } => {
            commands::validate(&config.storage, from_block).map(|report| {
                println!(
                    "ledger valid: {} blocks ({} transactions), next block {}",
                    report.blocks,
                    report.transactions,
                    report.next_block().unwrap_or(from_block)
                );
            })
        }
        Command::Status => commands::status(&config.storage).map(|status| println!("{status}")),
    };

    if let Err(e) = &result {
        error!("[li-rt] Fatal: {:#}", e);
    }
    result
}

async fn run_sync(config: IngestConfig, to_block: Option<u64>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("[li-rt] Ctrl+C received, stopping after the current block");
                if shutdown_tx.send(true).is_err() {
                    warn!("[li-rt] Pipeline already stopped");
                }
            }
            Err(e) => warn!("[li-rt] Cannot listen for Ctrl+C: {}", e),
        }
    });

    let mut ctx = PipelineContext::build(config, shutdown_rx)?;
    let outcome = ctx.sync(to_block).await?;

    match outcome {
        SyncOutcome::Completed { next_block, committed } => {
            println!("sync complete: {committed} blocks committed, next block {next_block}");
        }
        SyncOutcome::Cancelled { next_block, committed } => {
            println!("sync cancelled: {committed} blocks committed, resume at {next_block}");
        }
        SyncOutcome::UpToDate { next_block } => {
            println!("already up to date, next block {next_block}");
        }
    }
    Ok(())
}
