//! Logging initialization.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber.
///
/// A `RUST_LOG` environment variable overrides the configured level. Output
/// is structured JSON unless the format is set to `pretty` for local
/// development.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.format == "pretty" {
        builder.pretty().init();
    } else {
        builder.json().with_current_span(true).init();
    }
}
