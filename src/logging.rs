//! Tracing setup.
//!
//! Logs go to `~/.repair-timeline/repair-timeline.log` rather than the
//! terminal, so the TUI's alternate screen stays clean. `RUST_LOG` wins
//! over the configured `log-filter`, which defaults to `info`.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::Config;

const DEFAULT_FILTER: &str = "info";

/// Installs the global tracing subscriber.
pub fn init(config: &Config) -> Result<(), String> {
    let path = log_path().ok_or("could not determine home directory")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("failed to open log file {}: {e}", path.display()))?;

    let fallback = config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|e| format!("invalid log filter '{fallback}': {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init()
        .map_err(|e| format!("failed to install subscriber: {e}"))
}

/// The log file path: `~/.repair-timeline/repair-timeline.log`.
pub fn log_path() -> Option<PathBuf> {
    Config::home().map(|h| h.join("repair-timeline.log"))
}
