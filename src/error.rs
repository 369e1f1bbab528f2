//! Error types for card pool loading and mode parsing.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a card pool could not be loaded.
///
/// Every variant is recoverable: the session keeps its previous pool and
/// reports the failure through its status message.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status { status: u16 },

    /// Local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),

    /// The payload was not a JSON array of cards.
    #[error("malformed card data: {0}")]
    Malformed(String),

    #[error("invalid source key: {0:?}")]
    InvalidKey(String),
}

/// Coarse classification used by presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    Fetch,
    MalformedData,
}

impl LoadErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            LoadErrorKind::Fetch => "fetch error",
            LoadErrorKind::MalformedData => "malformed data",
        }
    }
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Malformed(_) => LoadErrorKind::MalformedData,
            _ => LoadErrorKind::Fetch,
        }
    }
}

/// A mode name that is not `simple`, `divination` or `hidden<lang>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode: {0:?}")]
pub struct UnknownMode(pub String);
