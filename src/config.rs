//! Runtime configuration from environment variables.
//!
//! | Variable                      | Default                   |
//! |-------------------------------|---------------------------|
//! | `COVIRISK_ARTIFACT`           | `models/covid_model.json` |
//! | `COVIRISK_MODEL`              | first model by name       |
//! | `COVIRISK_LOG_MODE`           | `auto`                    |
//! | `COVIRISK_LOG_FILE`           | `covirisk.log`            |
//! | `COVIRISK_REQUIRE_MANIFEST`   | `false`                   |
//! | `COVIRISK_SANITIZE_MAX_BYTES` | 16 KiB                    |

use std::path::PathBuf;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

pub const DEFAULT_ARTIFACT: &str = "models/covid_model.json";
pub const DEFAULT_LOG_FILE: &str = "covirisk.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Parse a boolean-ish value (`1`, `true`, `yes`, any case).
#[must_use]
pub fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub artifact_path: PathBuf,
    pub model_name: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub require_manifest: bool,
    pub sanitize_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT),
            model_name: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            require_manifest: false,
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            artifact_path: non_empty("COVIRISK_ARTIFACT")
                .map_or(defaults.artifact_path, PathBuf::from),
            model_name: non_empty("COVIRISK_MODEL"),
            log_mode: non_empty("COVIRISK_LOG_MODE")
                .map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: non_empty("COVIRISK_LOG_FILE").map_or(defaults.log_file, PathBuf::from),
            require_manifest: non_empty("COVIRISK_REQUIRE_MANIFEST")
                .is_some_and(|v| parse_bool(&v)),
            sanitize_max_bytes: non_empty("COVIRISK_SANITIZE_MAX_BYTES")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.sanitize_max_bytes),
        }
    }
}
