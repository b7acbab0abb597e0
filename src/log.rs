//! Logging setup for the CLI entry point.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, filter::Targets, fmt, prelude::*};

/// Installs the global subscriber. Crate logs are silent unless `verbose`
/// is set; `RUST_LOG` overrides everything when present.
pub fn init_logging(verbose: bool) {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "off" }));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(Targets::new().with_target("valuta", app_level))
        .with(env_filter)
        .init();
}
