//! Structured logging setup using tracing.
//!
//! JSON output is meant for log aggregation; pretty output for local runs.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Build the filter from `RUST_LOG`, falling back to `filter`.
pub fn build_filter(filter: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))
}

/// Initialize the global tracing subscriber.
///
/// # Arguments
///
/// * `filter` - The log filter directive (e.g., "info,subscriber_api_purchases=debug")
/// * `format` - JSON or pretty output
///
/// # Panics
///
/// Panics if the subscriber has already been initialized.
pub fn init_logging(filter: &str, format: LogFormat) {
    let filter_layer = match build_filter(filter) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("FATAL: Failed to create log filter: {e}");
            std::process::exit(1);
        }
    };

    let registry = tracing_subscriber::registry().with(filter_layer);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .flatten_event(true),
            )
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_target(true)).init(),
    }

    tracing::info!(filter = %filter, format = ?format, "Logging initialized");
}

/// Initialize logging for tests (with simpler output).
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
