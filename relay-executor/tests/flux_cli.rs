//! Flux backend against a scripted stand-in for the `flux` tools
//!
//! Kept to a single test so that no other test forks while the script is
//! being written.

mod common;

use common::{Event, Recorder, drain};
use relay_core::domain::job::{JobRequest, Resources};
use relay_executor::{ExecutorRegistry, ExecutorSettings, RemoteExecutor};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const FAKE_FLUX: &str = r#"#!/bin/sh
state="$(dirname "$0")"
case "$1" in
  --version)
    echo "commands:    0.63.0"
    ;;
  getattr)
    echo 0
    ;;
  submit)
    n=$(cat "$state/counter" 2>/dev/null || echo 0)
    n=$((n + 1))
    echo "$n" > "$state/counter"
    printf '%s\n' "$@" > "$state/submit-f$n.args"
    echo "f$n"
    ;;
  jobs)
    id="$4"
    if [ -f "$state/cancel-$id" ]; then
      echo "INACTIVE|CANCELED|-"
    elif [ "$id" = "f1" ]; then
      echo "INACTIVE|COMPLETED|0"
    elif [ "$id" = "f2" ]; then
      echo "INACTIVE|FAILED|3"
    elif [ "$id" = "f4" ]; then
      echo "flux-jobs: ERROR: $id: unknown job id" >&2
      exit 1
    elif [ "$id" = "f5" ]; then
      :
    else
      echo "RUN||"
    fi
    ;;
  cancel)
    touch "$state/cancel-$2"
    ;;
  *)
    echo "unexpected flux command: $1" >&2
    exit 1
    ;;
esac
"#;

fn install_fake_flux(dir: &Path) -> std::path::PathBuf {
    let program = dir.join("flux");
    std::fs::write(&program, FAKE_FLUX).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
    program
}

#[tokio::test]
async fn test_flux_lifecycle_through_cli() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let program = install_fake_flux(bin.path());

    let recorder = Arc::new(Recorder::default());
    let mut settings = ExecutorSettings::new("flux")
        .with_workdir(work.path())
        .with_namespace("it");
    settings.flux_program = program;

    let mut executor = RemoteExecutor::create(
        &ExecutorRegistry::with_builtin(),
        settings,
        recorder.clone(),
    )
    .await
    .unwrap();

    let ok = executor
        .run_job(JobRequest::new(1, "hello", "echo hi").with_threads(2))
        .await
        .unwrap();
    let failed = executor
        .run_job(JobRequest::new(2, "broken", "false"))
        .await
        .unwrap();
    let running = executor
        .run_job(JobRequest::new(3, "slow", "sleep 600").with_resources(Resources {
            runtime: 15,
            ..Resources::default()
        }))
        .await
        .unwrap();

    assert_eq!(ok.external_id, "f1");
    assert_eq!(failed.external_id, "f2");
    assert_eq!(running.external_id, "f3");

    // f4 and f5 are jobs the instance no longer knows about
    let forgotten = executor
        .run_job(JobRequest::new(4, "purged", "true"))
        .await
        .unwrap();
    let silent = executor
        .run_job(JobRequest::new(5, "silent", "true"))
        .await
        .unwrap();
    assert_eq!(forgotten.external_id, "f4");
    assert_eq!(silent.external_id, "f5");

    let args = std::fs::read_to_string(bin.path().join("submit-f1.args"))
        .unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert!(args.contains(&"--job-name=relayjob-it-hello-1"));
    assert!(args.contains(&"--cores-per-task=2"));
    assert!(!args.iter().any(|a| a.starts_with("--time-limit")));
    assert_eq!(&args[args.len() - 3..], &["--", "echo", "hi"]);

    let args = std::fs::read_to_string(bin.path().join("submit-f3.args"))
        .unwrap();
    assert!(args.lines().any(|a| a == "--time-limit=900s"));

    let summary = executor.check_active_jobs().await;
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.active, 1);
    let active: Vec<&str> = executor
        .active_jobs()
        .map(|job| job.external_id.as_str())
        .collect();
    assert_eq!(active, vec!["f3"]);

    let events = recorder.events();
    assert!(events.contains(&Event::Succeeded(1)));
    assert!(events.contains(&Event::Failed(
        2,
        "Flux job 'f2' finished with non-zero exit code 3.".to_string(),
        vec![failed.aux.log_file.clone()],
    )));
    for (job_id, id, log) in [(4, "f4", &forgotten), (5, "f5", &silent)] {
        assert!(events.contains(&Event::Failed(
            job_id,
            format!("Flux job '{}' failed.", id),
            vec![log.aux.log_file.clone()],
        )));
    }

    let summary = executor.cancel_jobs().await;
    assert_eq!(summary.requested, 1);
    assert!(bin.path().join("cancel-f3").exists());
    assert!(!bin.path().join("cancel-f1").exists());

    // Nothing left to poll after cancellation
    drain(&mut executor, Duration::from_secs(1)).await;
    assert_eq!(recorder.events().len(), 9);
}
