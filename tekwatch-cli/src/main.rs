//! tekwatch
//!
//! Follows the Tekton pipeline run started by a trigger event and streams
//! the logs of its steps to stdout, exiting with the status of the first
//! failing step.
//!
//! Architecture:
//! - Configuration: settings from the environment, event id from argv
//! - Services: endpoint resolution, run lookup, log tailing
//! - Scheduler: the watch session (locate, stream, finish)
//!
//! Diagnostics go to stderr; stdout carries only the pipeline output.

mod config;
mod error;
mod scheduler;
mod service;
mod sink;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tekwatch_client::{PipelineApi, TektonClient};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::{RunWatcher, WatchSettings};
use crate::service::{EndpointResolver, LogTailer, RunLocator};
use crate::sink::StdoutSink;

/// Filter used when neither `TEKWATCH_LOG_LEVEL` nor `RUST_LOG` is set
const DEFAULT_LOG_FILTER: &str = "tekwatch_cli=info";

#[derive(Parser)]
#[command(name = "tekwatch")]
#[command(about = "Stream the logs of a Tekton pipeline run", long_about = None)]
struct Cli {
    /// Trigger event id, used when EVENT_ID is not set
    event_id: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match start(cli).await {
        Ok(code) => code,
        Err(e) => {
            // tracing may not be initialized yet
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(process_exit_code(code));
}

/// Sets everything up and runs the watch session
///
/// Returns the exit status of the watch; errors are startup failures.
async fn start(cli: Cli) -> Result<i32> {
    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_positional_trigger(cli.event_id);

    init_tracing(config.log_level.as_deref());

    config.validate()?;

    info!(
        "Loaded configuration: endpoints={:?}, namespace={}, log_diff={}, fail_fast={}",
        config
            .endpoints
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>(),
        config.namespace,
        config.log_diff,
        config.fail_fast
    );

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let client = TektonClient::with_client(config.namespace.clone(), http)
        .with_token(config.token.clone());
    let api: Arc<dyn PipelineApi> = Arc::new(client);

    let trigger_id = config.trigger_id.clone().unwrap_or_default();
    let resolver = EndpointResolver::new(config.endpoints.clone());
    let locator = RunLocator::new(Arc::clone(&api), resolver, trigger_id);
    let tailer = LogTailer::new(api, StdoutSink, config.log_diff);

    let mut watcher = RunWatcher::new(WatchSettings::from(&config), locator, tailer);

    let code = match watcher.run_until(shutdown_signal()).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };

    Ok(code)
}

/// Initializes diagnostics on stderr
///
/// `TEKWATCH_LOG_LEVEL` wins over `RUST_LOG`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Resolves on ctrl-c
///
/// If the handler cannot be installed the watch simply runs uncancellable.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Maps a status onto what the process can report
///
/// Codes outside 0..=255 would be truncated by the OS, possibly to 0.
fn process_exit_code(code: i32) -> i32 {
    if (0..=255).contains(&code) { code } else { 1 }
}
