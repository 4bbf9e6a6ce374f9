//! Download retry timing, driven with paused time.

use crate::support::{orchestrator, record, test_config, DownloadScript, MockPlatform};
use dataset_ingest::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_then_succeed() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(vec![vec![record("a/flaky")]]));
    client.script_download("a/flaky", DownloadScript::FlakyTimes(2));
    let mut orchestrator = orchestrator(config, client.clone(), Shutdown::shared());

    let start = Instant::now();
    let report = orchestrator.poll_once().await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(client.download_calls().len(), 3);
    // Defaults: 4s before attempt two, 8s before attempt three.
    assert_eq!(start.elapsed(), Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(vec![vec![record("a/down")]]));
    client.script_download("a/down", DownloadScript::AlwaysFlaky);
    let mut orchestrator = orchestrator(config, client.clone(), Shutdown::shared());

    let report = orchestrator.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(client.download_calls().len(), 3);
    assert_eq!(orchestrator.statistics().failed_downloads, 1);
}

#[tokio::test]
async fn test_permanent_failure_skips_the_backoff_entirely() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(vec![vec![record("a/gone")]]));
    client.script_download("a/gone", DownloadScript::Missing);
    let mut orchestrator = orchestrator(config, client.clone(), Shutdown::shared());

    let report = orchestrator.poll_once().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(client.download_calls().len(), 1);
}
