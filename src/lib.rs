//! Radar Index Library
//!
//! The discovery layer of a radar-data server. Given an on-disk archive of
//! time-stamped radar product files organised by station and day, it answers
//! "which product files exist for station S, variable V, in window [t0, t1]"
//! without rescanning the archive on every request.
//!
//! This library provides tools for:
//! - Recognising archive day and time tokens in directory and file names
//! - Building per-day station indexes and persisting them as binary snapshots
//! - Caching one index per dataset and detecting when a cached index is stale
//! - Merging retained history with a live scan of days still receiving data
//! - Evaluating station/time-window queries into ordered product listings

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod dataset_index;
        pub mod day_index;
        pub mod naming;
        pub mod query;
        pub mod registry;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ArchiveLayout, NamingConvention, ProductEntry, TimeSelection};
pub use app::services::dataset_index::{DatasetIndex, LayoutHints, StationView};
pub use app::services::day_index::{DayIndex, ProductFile};
pub use app::services::query::{QueryRequest, evaluate};
pub use app::services::registry::IndexRegistry;
pub use config::IndexConfig;

use std::path::PathBuf;

/// Result type alias for radar index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for radar index operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Dataset path has no configured archive root
    #[error("Unknown dataset: {dataset}")]
    UnknownDataset { dataset: String },

    /// Caller supplied a malformed day or time token
    #[error("Invalid {kind} token: '{value}'")]
    InvalidToken { kind: &'static str, value: String },

    /// Snapshot file could not be read back
    #[error("Snapshot error in '{}': {message}", path.display())]
    Snapshot { path: PathBuf, message: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Encoding or decoding failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown dataset error
    pub fn unknown_dataset(dataset: impl Into<String>) -> Self {
        Self::UnknownDataset {
            dataset: dataset.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidToken {
            kind,
            value: value.into(),
        }
    }

    /// Create a snapshot error
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// True for errors that mean "this snapshot cannot be trusted"
    pub fn is_snapshot_corruption(&self) -> bool {
        matches!(self, Self::Snapshot { .. } | Self::Serialization { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid TOML: {}", error),
        }
    }
}
