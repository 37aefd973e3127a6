//! CLI entry point for the kitscan tool.

use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kitscan_core::{
    FeedSource, Match, Pipeline, ReaderSource, ScanConfig, SeedSource, shutdown_channel,
};
use tracing::{debug, info, warn};

mod cli;
mod progress;
mod terminal;

use cli::Args;

/// Environment variable holding a PhishTank API key.
const API_KEY_ENV: &str = "PT_API_KEY";

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let no_color = terminal::should_disable_color(
        terminal::no_color_env_requested(),
        terminal::is_dumb_terminal(),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(!no_color)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("kitscan starting");

    let config = ScanConfig {
        concurrency: usize::from(args.concurrency),
        timeout: Duration::from_secs(args.timeout),
        download: args.download,
        output_dir: args.output_dir.clone(),
        ..ScanConfig::default()
    };

    let mut source: Box<dyn SeedSource> = if io::stdin().is_terminal() {
        let api_key = env::var(API_KEY_ENV).ok();
        Box::new(FeedSource::new(&args.feed_kinds(), api_key.as_deref())?)
    } else {
        debug!("reading seeds from stdin");
        Box::new(ReaderSource::new(tokio::io::stdin()))
    };

    let seeds = source
        .seeds()
        .await
        .with_context(|| format!("failed to load seeds from {}", source.name()))?;

    if seeds.is_empty() {
        info!("No seed URLs to scan");
        return Ok(ExitCode::SUCCESS);
    }
    info!(seeds = seeds.len(), source = source.name(), "Loaded seeds");

    let pipeline = Pipeline::new(config)
        .context("failed to set up scan")?
        .with_sink(|found: &Match| println!("{}", found.archive_url()));

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, draining pipeline");
            trigger.trigger();
        }
    });

    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) =
        progress::spawn_progress_ui(use_spinner, pipeline.stats());

    let stats = pipeline.run(seeds, shutdown).await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    if stats.was_interrupted() {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}
