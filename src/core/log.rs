//! Tracing setup for the command line binary.
//!
//! Diagnostics are written to stderr, stdout carries the tables and the
//! list of exported files.

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = env!("CARGO_CRATE_NAME");

fn app_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Installs the global subscriber. Logging stays off unless `verbose` is set
/// or `RUST_LOG` asks for it.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = app_level(verbose);
    let app_filter = Targets::new().with_target(APP_TARGET, level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .try_init()
        .context("Failed to install the tracing subscriber")
}
