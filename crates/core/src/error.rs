// crates/core/src/error.rs
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use statline_types::PlayerIdError;

/// Errors raised before any store access because the request itself is bad.
///
/// Never retriable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    InvalidPlayer(#[from] PlayerIdError),

    #[error("limit must be between {min} and {max}, got {limit}")]
    LimitOutOfRange { limit: u32, min: u32, max: u32 },

    #[error("end ({end}) must be after start ({start})")]
    EmptyRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("experience must be a finite number, got {0}")]
    NonFiniteExperience(f64),
}

impl ValidationError {
    pub fn empty_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::EmptyRange { start, end }
    }
}

/// Why an operation stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("cancelled")]
    Cancelled,

    #[error("past its deadline")]
    DeadlineExceeded,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}
