//! WebScout library
//!
//! Exposes the CLI wiring modules for integration testing.

pub mod cli;
pub mod config;
pub mod demo;
pub mod form_values;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` controls the
/// filter; defaults to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
