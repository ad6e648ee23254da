//! Structured logging setup for the CLI.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to
//! binaries so that embedding applications keep control of their own output.

use std::io;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVEL_ENV: &str = "UTILS_LOG_LEVEL";
const ALT_LEVEL_ENV: &str = "RUST_LOG";
const DEFAULT_LEVEL: &str = "info";

static LOGGER: OnceLock<Result<(), String>> = OnceLock::new();

/// Installs a stderr subscriber. Later calls return the first call's outcome.
///
/// `fallback` is used when neither `UTILS_LOG_LEVEL` nor `RUST_LOG` is set,
/// typically the `logLevel` entry of a config file.
pub fn init(fallback: Option<&str>) -> io::Result<()> {
    match LOGGER.get_or_init(|| configure(fallback)) {
        Ok(()) => Ok(()),
        Err(err) => Err(io::Error::new(io::ErrorKind::Other, err.clone())),
    }
}

fn build_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_env(LEVEL_ENV)
        .or_else(|_| EnvFilter::try_from_env(ALT_LEVEL_ENV))
        .or_else(|_| EnvFilter::try_new(fallback.unwrap_or(DEFAULT_LEVEL)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

fn configure(fallback: Option<&str>) -> Result<(), String> {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(build_filter(fallback))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| format!("{e}"))
}
