//! Centralized configuration for the playground.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than halfway through a run.

use std::env;

/// Upper bound for `PLAYGROUND_SEED`.
const MAX_SEED: usize = 1000;

/// Which adapter families to install and exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilySelection {
    Async,
    Sync,
    Both,
}

impl FamilySelection {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "async" => Some(Self::Async),
            "sync" => Some(Self::Sync),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn runs_async(&self) -> bool {
        matches!(self, Self::Async | Self::Both)
    }

    pub fn runs_sync(&self) -> bool {
        matches!(self, Self::Sync | Self::Both)
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A rejected environment variable.
#[derive(Debug, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

/// Playground configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log format (default: pretty)
    pub log_format: LogFormat,
    /// Families to exercise (default: both)
    pub family: FamilySelection,
    /// Records seeded per resource (default: 3)
    pub seed: usize,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Log format
        let format_str = var("LOG_FORMAT").unwrap_or_else(|| "pretty".into());
        let log_format = LogFormat::from_str(&format_str).ok_or_else(|| ConfigError {
            field: "LOG_FORMAT",
            message: format!("expected pretty or json, got '{}'", format_str),
        })?;

        // Families
        let family_str = var("PLAYGROUND_FAMILY").unwrap_or_else(|| "both".into());
        let family = FamilySelection::from_str(&family_str).ok_or_else(|| ConfigError {
            field: "PLAYGROUND_FAMILY",
            message: format!("expected async, sync or both, got '{}'", family_str),
        })?;

        // Seed size
        let seed = match var("PLAYGROUND_SEED") {
            None => 3,
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError {
                field: "PLAYGROUND_SEED",
                message: format!("invalid number '{}': {}", raw, e),
            })?,
        };
        if seed > MAX_SEED {
            return Err(ConfigError {
                field: "PLAYGROUND_SEED",
                message: format!("must be at most {}", MAX_SEED),
            });
        }

        Ok(Self {
            log_format,
            family,
            seed,
        })
    }
}
