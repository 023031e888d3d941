//! CLI command implementations.

pub mod scenario;
pub mod stress;

use busydb_core::CoreError;
use std::str::FromStr;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--format` value is not supported.
    #[error("unknown output format {0:?} (expected text or json)")]
    UnknownFormat(String),

    /// A store operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON rendering failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A run finished but its checks did not hold.
    #[error("check failed: {0}")]
    CheckFailed(String),
}

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CliError::UnknownFormat(other.to_owned())),
        }
    }
}
