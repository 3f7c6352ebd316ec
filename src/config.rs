//! Configuration management and validation.
//!
//! Provides the index configuration: retention and staleness tuning, the
//! case study marker, and the mapping from logical dataset paths (as the
//! query layer names them) to archive roots on disk.

use crate::app::models::{ArchiveLayout, NamingConvention};
use crate::app::services::dataset_index::LayoutHints;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CASE_STUDY_MARKER, DEFAULT_DAYS_TO_READ,
    DEFAULT_STALE_SAMPLE_SIZE,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One logical dataset served from one archive root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Logical dataset path, e.g. `nexrad/level2/IDD`
    pub path: String,

    /// Archive root directory
    pub root: PathBuf,

    /// Layout override; probed from the archive when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<ArchiveLayout>,

    /// Naming convention override; sampled from file names when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming: Option<NamingConvention>,
}

impl DatasetConfig {
    pub fn new(path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
            layout: None,
            naming: None,
        }
    }

    pub fn with_layout(mut self, layout: ArchiveLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }
}

/// Main configuration for the radar index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of settled days retained per dataset index
    pub days_to_read: usize,

    /// Stations sampled per staleness check (approximate detection)
    pub stale_sample_size: usize,

    /// Path segment marker identifying case study archives
    pub case_study_marker: String,

    /// Evict each dataset index after a query has used it
    pub release_after_query: bool,

    /// Registered datasets
    pub datasets: Vec<DatasetConfig>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            days_to_read: DEFAULT_DAYS_TO_READ,
            stale_sample_size: DEFAULT_STALE_SAMPLE_SIZE,
            case_study_marker: DEFAULT_CASE_STUDY_MARKER.to_string(),
            release_after_query: false,
            datasets: Vec::new(),
        }
    }
}

impl IndexConfig {
    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        let config: IndexConfig = toml::from_str(&contents)?;
        debug!(
            "Loaded configuration from {} ({} datasets)",
            path.display(),
            config.datasets.len()
        );
        Ok(config)
    }

    /// Write the configuration as TOML
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::serialization(format!("Failed to encode config: {}", e)))?;
        fs::write(path, contents).map_err(|e| {
            Error::io(format!("Failed to write config file {}", path.display()), e)
        })
    }

    /// `<config dir>/radar-index/config.toml`, if the platform has a config dir
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Resolve the effective configuration
    ///
    /// An explicit path must exist and parse. Without one, the default config
    /// file is used when present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.days_to_read == 0 {
            return Err(Error::configuration("days_to_read must be at least 1"));
        }
        if self.stale_sample_size == 0 {
            return Err(Error::configuration("stale_sample_size must be at least 1"));
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.path.trim().is_empty() {
                return Err(Error::configuration("Dataset path must not be empty"));
            }
            if !seen.insert(dataset.path.as_str()) {
                return Err(Error::configuration(format!(
                    "Dataset '{}' is configured more than once",
                    dataset.path
                )));
            }
        }
        Ok(())
    }

    pub fn with_days_to_read(mut self, days: usize) -> Self {
        self.days_to_read = days;
        self
    }

    pub fn with_stale_sample_size(mut self, size: usize) -> Self {
        self.stale_sample_size = size;
        self
    }

    pub fn with_case_study_marker(mut self, marker: impl Into<String>) -> Self {
        self.case_study_marker = marker.into();
        self
    }

    /// Evict dataset indexes after every query
    pub fn with_release_after_query(mut self) -> Self {
        self.release_after_query = true;
        self
    }

    /// Register a dataset, replacing any existing entry with the same path
    pub fn with_dataset(mut self, dataset: DatasetConfig) -> Self {
        self.datasets.retain(|d| d.path != dataset.path);
        self.datasets.push(dataset);
        self
    }

    /// Look up a dataset by logical path
    pub fn dataset(&self, path: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.path == path)
    }

    /// Layout hints for opening a dataset
    pub fn layout_hints(&self, dataset: &DatasetConfig) -> LayoutHints {
        LayoutHints {
            layout: dataset.layout,
            naming: dataset.naming,
            days_to_read: self.days_to_read,
            case_study_marker: self.case_study_marker.clone(),
        }
    }
}
