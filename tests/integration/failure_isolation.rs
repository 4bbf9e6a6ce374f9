//! One broken dataset never stalls the rest of the cycle.

use crate::support::{orchestrator, record, test_config, DownloadScript, MockPlatform};
use dataset_ingest::shutdown::Shutdown;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_failed_dataset_does_not_block_the_others() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let client = Arc::new(MockPlatform::new(vec![vec![
        record("a/first"),
        record("b/broken"),
        record("c/third"),
    ]]));
    client.script_download("b/broken", DownloadScript::Missing);
    let mut orchestrator = orchestrator(config.clone(), client.clone(), Shutdown::shared());

    let report = orchestrator.poll_once().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(orchestrator.statistics().successful_downloads, 2);
    assert_eq!(orchestrator.statistics().failed_downloads, 1);

    // The datasets after the broken one were still processed, in order.
    assert_eq!(client.download_calls(), vec!["a/first", "b/broken", "c/third"]);

    // No metadata and no leftover content for the failure.
    assert!(!config
        .metadata_dir
        .join("mockhub_b__broken.json")
        .exists());
    assert!(!config.data_dir.join("b").join("broken").exists());
}

#[tokio::test]
async fn test_failed_dataset_is_not_reattempted_next_cycle() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let listing = vec![record("b/broken"), record("c/fine")];
    let client = Arc::new(MockPlatform::new(vec![listing.clone(), listing]));
    client.script_download("b/broken", DownloadScript::Missing);
    let mut orchestrator = orchestrator(config, client.clone(), Shutdown::shared());

    orchestrator.poll_once().await.unwrap();
    let second = orchestrator.poll_once().await.unwrap();

    // Retries were exhausted in cycle one; the broken dataset is now marked
    // processed and never attempted again.
    assert_eq!(second.fresh, 0);
    assert_eq!(client.download_calls(), vec!["b/broken", "c/fine"]);
}
