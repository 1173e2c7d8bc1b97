//! # Query Human CLI
//!
//! Ask a human one question from a shell and print the outcome as JSON.
//! Ctrl+C or SIGTERM stops waiting.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

use query_human::logging::init_logging_with_level;
use query_human::{AbortHandle, HumanQueryClient, QueryHumanConfig};

#[derive(Parser, Debug)]
#[command(name = "query-human")]
#[command(about = "Ask a human a question and wait for the answer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// API key for the human-query service
    #[arg(long, env = "QUERY_HUMAN_API_KEY", hide_env_values = true)]
    api_key: String,

    /// ID of the agent asking
    #[arg(long, default_value = "")]
    agent_id: String,

    /// Name of the agent asking
    #[arg(long, default_value = "")]
    agent_name: String,

    /// The question
    #[arg(short, long)]
    query: String,

    /// Context and consequences for the human
    #[arg(short, long, default_value = "")]
    metadata: String,

    /// Seconds to wait for an answer (default from config, 24 hours)
    #[arg(short, long)]
    timeout: Option<i64>,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Configuration file path (default: ./query-human.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    init_logging_with_level(Some(log_level));

    let mut config = match &cli.config {
        Some(path) => QueryHumanConfig::load_with_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => QueryHumanConfig::load().context("loading config")?,
    };
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
        config.validate().context("invalid --base-url")?;
    }

    let client = HumanQueryClient::new(&config)?;
    let mut builder = client
        .request(cli.api_key, cli.agent_id, cli.agent_name, cli.query)
        .metadata(cli.metadata);
    if let Some(timeout) = cli.timeout {
        builder = builder.timeout_seconds(timeout);
    }
    let request = builder.build()?;

    let (abort, signal) = AbortHandle::new();
    tokio::spawn(async move {
        shutdown_signal().await;
        abort.abort();
    });

    let outcome = client.ask_with_abort(&request, &signal).await?;
    info!(outcome = outcome.kind(), "Query finished");

    println!("{}", serde_json::to_string_pretty(&outcome.into_value())?);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
