//! Logging and tracing utilities
//!
//! Log lines go to stderr so command output on stdout stays machine readable.

use crate::config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with(&Config::default());
}

/// Initialize tracing with the configured level and format; `RUST_LOG` wins
pub fn init_tracing_with(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
