//! Repair timeline configuration.
//!
//! Loaded from `~/.repair-timeline/config.toml`. Defaults apply if missing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::editor::SeedPolicy;
use crate::model::StatusCatalog;

/// Repair timeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Operator recorded on detail edits when `--as` and
    /// `REPAIR_OPERATOR` are both absent.
    pub operator: Option<String>,

    /// Label shown for status codes outside the catalog.
    pub unknown_status: UnknownStatus,

    /// How the editor seeds a draft from a structured detail.
    pub structured_seed: StructuredSeed,

    /// Tracing filter directive. `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatus {
    /// Same label as "Repair Marked Complete".
    #[default]
    Parity,
    /// "Unknown Status".
    Distinct,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructuredSeed {
    /// Open structured details with an empty draft.
    #[default]
    Empty,
    /// Open structured details with their pretty-printed JSON.
    Rendered,
}

impl Config {
    /// Load config from `~/.repair-timeline/config.toml`.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is
    /// an error.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.repair-timeline/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::home().map(|h| h.join("config.toml"))
    }

    /// The application directory: `~/.repair-timeline/`.
    pub fn home() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".repair-timeline"))
    }

    pub fn catalog(&self) -> StatusCatalog {
        match self.unknown_status {
            UnknownStatus::Parity => StatusCatalog::parity(),
            UnknownStatus::Distinct => StatusCatalog::distinct(),
        }
    }

    pub fn seed_policy(&self) -> SeedPolicy {
        match self.structured_seed {
            StructuredSeed::Empty => SeedPolicy::TextOnly,
            StructuredSeed::Rendered => SeedPolicy::Rendered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.catalog(), StatusCatalog::parity());
        assert_eq!(config.seed_policy(), SeedPolicy::TextOnly);
    }

    #[test]
    fn parses_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "operator = \"bench-2\"\n\
             unknown-status = \"distinct\"\n\
             structured-seed = \"rendered\"\n\
             log-filter = \"debug\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.operator.as_deref(), Some("bench-2"));
        assert_eq!(config.catalog(), StatusCatalog::distinct());
        assert_eq!(config.seed_policy(), SeedPolicy::Rendered);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn invalid_value_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "unknown-status = \"loud\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("invalid config"));
    }
}
