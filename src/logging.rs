//! Tracing subscriber setup for the bootstrap layer.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with optional JSON formatting.
///
/// Honors `RUST_LOG` for filtering (defaulting to `dataset_ingest=info`)
/// and `LOG_FORMAT=json` for structured output. Call once at startup;
/// repeated calls are ignored.
pub fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dataset_ingest=info"));

    let result = if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = result;
}
