//! Job command handlers
//!
//! Loads job requests, builds the executor and hands both to the host loop.

use anyhow::{Context, Result, bail};
use colored::*;
use relay_client::EngineClient;
use relay_core::domain::job::{JobRequest, Resources};
use relay_executor::{
    CompositeReporter, ExecutorRegistry, ExecutorSettings, HttpReporter, JobReporter,
    RemoteExecutor,
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{Overrides, load_settings};
use crate::console::ConsoleReporter;
use crate::host::{RunReport, drive};

/// Run every job from a JSON file
pub async fn handle_run(path: &Path, overrides: &Overrides) -> Result<()> {
    let jobs = load_jobs(path)?;
    if jobs.is_empty() {
        println!("{}", "No jobs to run.".yellow());
        return Ok(());
    }

    run(jobs, overrides).await
}

/// Run a single job
pub async fn handle_submit(request: JobRequest, overrides: &Overrides) -> Result<()> {
    run(vec![request], overrides).await
}

/// Builds a request for a command given as separate words
pub fn command_request(
    rule: &str,
    threads: u32,
    cpus: Option<u32>,
    runtime: u64,
    words: &[String],
) -> Result<JobRequest> {
    let command = shlex::try_join(words.iter().map(String::as_str))
        .context("Command cannot be quoted for the shell")?;

    Ok(JobRequest::new(1, rule, command)
        .with_threads(threads)
        .with_resources(Resources {
            cpus_per_task: cpus,
            runtime,
            ..Resources::default()
        }))
}

/// Reads a JSON array of job requests
///
/// Requests without a job id are numbered by position, starting at 1.
pub fn load_jobs(path: &Path) -> Result<Vec<JobRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    let mut jobs: Vec<JobRequest> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse job file {}", path.display()))?;

    for (index, job) in jobs.iter_mut().enumerate() {
        if job.job_id == 0 {
            job.job_id = index as u64 + 1;
        }
    }

    Ok(jobs)
}

fn reporter(settings: &ExecutorSettings) -> Arc<dyn JobReporter> {
    match &settings.engine_url {
        Some(url) => Arc::new(
            CompositeReporter::new()
                .with(Arc::new(ConsoleReporter))
                .with(Arc::new(HttpReporter::new(EngineClient::new(url.clone())))),
        ),
        None => Arc::new(ConsoleReporter),
    }
}

async fn run(jobs: Vec<JobRequest>, overrides: &Overrides) -> Result<()> {
    let settings = load_settings(overrides)?;
    let reporter = reporter(&settings);

    println!(
        "{}",
        format!(
            "Running {} job(s) on the {} backend",
            jobs.len(),
            settings.backend
        )
        .bold()
    );

    let executor = RemoteExecutor::create(&ExecutorRegistry::with_builtin(), settings, reporter)
        .await
        .context("Failed to start executor")?;

    let report = drive(executor, jobs).await?;
    print_report(&report);

    if let Some(cancelled) = &report.cancelled {
        bail!(
            "Run interrupted; {} job(s) cancelled",
            cancelled.requested
        );
    }
    if report.failed > 0 {
        bail!("{} job(s) failed", report.failed);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  Submitted: {}", report.submitted);
    println!("  Succeeded: {}", report.succeeded.to_string().green());
    if report.failed > 0 {
        println!("  Failed:    {}", report.failed.to_string().red());
    } else {
        println!("  Failed:    {}", report.failed);
    }

    if let Some(cancelled) = &report.cancelled {
        println!("  Cancelled: {}", cancelled.requested.to_string().yellow());
        for (id, error) in &cancelled.failed {
            println!("    {} {}: {}", "⚠".yellow(), id, error.dimmed());
        }
    }
}
