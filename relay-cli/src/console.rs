//! Console reporter
//!
//! Prints job lifecycle events for a human watching the terminal.

use async_trait::async_trait;
use colored::*;
use relay_core::domain::submission::SubmittedJobInfo;
use relay_executor::JobReporter;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter;

#[async_trait]
impl JobReporter for ConsoleReporter {
    async fn report_submission(&self, job: &SubmittedJobInfo) {
        println!(
            "  {} Job {} ({}) submitted as {}",
            "▸".cyan(),
            job.request.job_id,
            job.request.rule.bold(),
            job.external_id.dimmed()
        );
    }

    async fn report_success(&self, job: &SubmittedJobInfo) {
        println!(
            "  {} Job {} ({}) finished",
            "✓".green(),
            job.request.job_id,
            job.request.rule.bold()
        );
    }

    async fn report_failure(&self, job: &SubmittedJobInfo, message: &str, aux_logs: &[PathBuf]) {
        println!(
            "  {} Job {} ({}) failed: {}",
            "✗".red(),
            job.request.job_id,
            job.request.rule.bold(),
            message
        );
        for log in aux_logs {
            println!("    Log: {}", log.display().to_string().dimmed());
        }
    }
}
