//! Shared utilities for the equity analysis workspace
//!
//! Logging setup and process-level configuration used by the binaries.

pub mod config;
pub mod logging;

pub use config::{Config, LogFormat, ParseLogFormatError};
pub use logging::{init_tracing, init_tracing_with};
