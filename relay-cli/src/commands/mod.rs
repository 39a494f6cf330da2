//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod backends;
mod job;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Overrides;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run every job in a JSON job file
    Run {
        /// JSON array of job requests
        #[arg(long)]
        jobs: PathBuf,
    },
    /// Run a single command as a job
    Submit {
        /// Workflow step name
        #[arg(long, default_value = "cli")]
        rule: String,

        /// Threads for the job
        #[arg(long, default_value_t = 1)]
        threads: u32,

        /// CPUs per task, overriding the thread count
        #[arg(long)]
        cpus: Option<u32>,

        /// Wall-clock limit in minutes (0 means unlimited)
        #[arg(long, default_value_t = 0)]
        runtime: u64,

        /// Command line to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
    /// List available executor backends
    Backends,
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `overrides` - Settings given on the command line
pub async fn handle_command(command: Commands, overrides: &Overrides) -> Result<()> {
    match command {
        Commands::Run { jobs } => job::handle_run(&jobs, overrides).await,
        Commands::Submit {
            rule,
            threads,
            cpus,
            runtime,
            command,
        } => {
            let request = job::command_request(&rule, threads, cpus, runtime, &command)?;
            job::handle_submit(request, overrides).await
        }
        Commands::Backends => backends::list_backends(),
    }
}
