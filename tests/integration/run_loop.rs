//! The full run loop: waiting, shutdown latency, and failure resilience.

use crate::support::{orchestrator, record, test_config, MockPlatform};
use dataset_ingest::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_waiting_and_saves_state() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(vec![vec![record("a/x")]]));
    let shutdown = Shutdown::shared();
    let mut service = orchestrator(config.clone(), client, shutdown.clone());

    let handle = tokio::spawn(async move { service.run().await });

    // Let the first cycle run to its persist; the loop then enters the 300s
    // wait. Yielding instead of sleeping keeps the paused clock untouched.
    let canonical = config.state_dir.join("tracking_state.json");
    while !canonical.is_file() {
        tokio::task::yield_now().await;
    }

    // Remove the cycle's save so the file can only reappear via the final
    // save on the shutdown path.
    std::fs::remove_file(&canonical).unwrap();

    shutdown.request();
    let asked = Instant::now();
    handle.await.unwrap().unwrap();

    // The wait was interrupted, not slept out.
    assert!(asked.elapsed() < Duration::from_secs(1));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&canonical).unwrap()).unwrap();
    assert_eq!(doc["statistics"]["total_polls"], 1);
    assert_eq!(doc["processed_refs"], serde_json::json!(["a/x"]));
}

#[tokio::test(start_paused = true)]
async fn test_expired_credentials_mid_run_do_not_kill_the_loop() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(Vec::new()));
    client.expire_credentials();
    let shutdown = Shutdown::shared();
    let mut service = orchestrator(config, client.clone(), shutdown.clone());

    let handle = tokio::spawn(async move { service.run().await });

    // Failed polls wait the short retry delay (60s), so 150s covers three
    // listing attempts. The loop must still be alive for all of them.
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(client.list_calls(), 3);

    shutdown.request();
    let result = handle.await.unwrap();
    assert!(result.is_ok(), "auth expiry mid-run ended the loop: {result:?}");
}
