//! Relay CLI
//!
//! Runs workflow jobs on Flux (or locally) from the command line and
//! follows them until they finish.

mod commands;
mod config;
mod console;
mod host;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Overrides;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Run workflow jobs on a Flux instance", long_about = None)]
struct Cli {
    /// Executor backend (flux, local)
    #[arg(long, env = "RELAY_BACKEND")]
    backend: Option<String>,

    /// Working directory for every job
    #[arg(long, env = "RELAY_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Root directory for job logs, relative to the working directory
    #[arg(long, env = "RELAY_LOG_ROOT")]
    log_root: Option<PathBuf>,

    /// Word that makes job names unique to this run
    #[arg(long, env = "RELAY_NAMESPACE")]
    namespace: Option<String>,

    /// Environment variables passed to every job
    #[arg(long, env = "RELAY_ENVVARS", value_delimiter = ',')]
    envvars: Vec<String>,

    /// Workflow engine URL to report job events to
    #[arg(long, env = "RELAY_ENGINE_URL")]
    engine_url: Option<String>,

    /// Seconds between status checks
    #[arg(long, env = "RELAY_POLL_INTERVAL")]
    poll_interval: Option<u64>,

    /// Seconds to wait before the first status check
    #[arg(long, env = "RELAY_INIT_DELAY")]
    init_delay: Option<u64>,

    /// Path of the flux program
    #[arg(long, env = "RELAY_FLUX_BIN")]
    flux_bin: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,relay_executor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        backend: cli.backend,
        workdir: cli.workdir,
        log_root: cli.log_root,
        namespace: cli.namespace,
        envvars: cli.envvars,
        engine_url: cli.engine_url,
        poll_interval: cli.poll_interval,
        init_delay: cli.init_delay,
        flux_bin: cli.flux_bin,
    };

    handle_command(cli.command, &overrides).await
}
