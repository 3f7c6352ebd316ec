//! Index registry service
//!
//! Owns one [`DatasetIndex`] per `(dataset, variable)` key. Indexes are
//! opened lazily on first request, replaced when the staleness check finds
//! that a day has settled since they were opened, and evicted on request.
//!
//! The entry map is only locked for lookups and the final swap. Building is
//! serialized per key by a separate guard, so concurrent first requests for
//! one dataset open it once while other datasets stay available.

use crate::app::services::dataset_index::DatasetIndex;
use crate::app::services::day_index::DayIndex;
use crate::app::services::naming;
use crate::config::IndexConfig;
use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry key: logical dataset path plus optional variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub dataset: String,
    pub variable: Option<String>,
}

impl RegistryKey {
    pub fn new(dataset: &str, variable: Option<&str>) -> Self {
        Self {
            dataset: dataset.to_string(),
            variable: variable.map(str::to_string),
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variable {
            Some(variable) => write!(f, "{} [{}]", self.dataset, variable),
            None => f.write_str(&self.dataset),
        }
    }
}

/// Counters describing registry activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Requests served from a cached, fresh index
    pub hits: usize,

    /// Indexes opened for a key with no cached entry
    pub builds: usize,

    /// Indexes reopened because the cached one was stale
    pub rebuilds: usize,

    /// Explicit evictions
    pub evictions: usize,
}

/// Process-wide cache of dataset indexes
#[derive(Debug)]
pub struct IndexRegistry {
    config: IndexConfig,
    entries: RwLock<HashMap<RegistryKey, Arc<DatasetIndex>>>,
    build_guards: Mutex<HashMap<RegistryKey, Arc<Mutex<()>>>>,
    stats: Mutex<RegistryStats>,
}

impl IndexRegistry {
    /// Create an empty registry for the configured datasets
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            entries: RwLock::new(HashMap::new()),
            build_guards: Mutex::new(HashMap::new()),
            stats: Mutex::new(RegistryStats::default()),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Fetch the index of a dataset, opening or reopening it as needed
    ///
    /// # Errors
    /// Vacant indexes (variables with no directory) are returned but not
    /// cached, so arbitrary variable names never accumulate entries.
    ///
    /// # Errors
    /// * `Error::UnknownDataset` if the dataset path is not configured
    /// * `Error::InvalidToken` if `today` is not a day token or `variable`
    ///   is not a plain directory name
    /// * Any error from [`DatasetIndex::open`]
    pub fn get(
        &self,
        dataset: &str,
        variable: Option<&str>,
        today: &str,
    ) -> Result<Arc<DatasetIndex>> {
        let dataset_config = self
            .config
            .dataset(dataset)
            .ok_or_else(|| Error::unknown_dataset(dataset))?;
        if let Some(variable) = variable {
            naming::check_segment("variable", variable)?;
        }
        let key = RegistryKey::new(dataset, variable);

        if let Some(index) = self.cached(&key) {
            if !self.is_stale(&index, today)? {
                self.stats.lock().hits += 1;
                return Ok(index);
            }
        }

        let guard = self.build_guard(&key);
        let building = guard.lock();

        // Another request may have finished the build while we waited
        let previous = self.cached(&key);
        if let Some(index) = &previous {
            if !self.is_stale(index, today)? {
                self.stats.lock().hits += 1;
                return Ok(Arc::clone(index));
            }
        }

        let hints = self.config.layout_hints(dataset_config);
        let index = Arc::new(DatasetIndex::open(
            &dataset_config.root,
            variable,
            &hints,
            today,
        )?);

        if index.is_vacant() {
            drop(building);
            self.build_guards.lock().remove(&key);
            if self.entries.write().remove(&key).is_some() {
                self.stats.lock().evictions += 1;
            }
            debug!("Not caching vacant index for {}", key);
            return Ok(index);
        }
        self.entries.write().insert(key.clone(), Arc::clone(&index));

        let mut stats = self.stats.lock();
        if previous.is_some() {
            stats.rebuilds += 1;
            info!("Replaced stale index for {}", key);
        } else {
            stats.builds += 1;
            debug!("Cached new index for {}", key);
        }
        Ok(index)
    }

    /// Whether a cached index is missing a day that has since settled
    ///
    /// Case study indexes are never stale. Otherwise, if the index does not
    /// hold yesterday and none of the first `stale_sample_size` stations
    /// (ascending) lists yesterday as its most recent day, the index is
    /// stale once yesterday's snapshot exists on disk. The station sample
    /// bounds the cost of the check; it is a heuristic, not exhaustive.
    pub fn is_stale(&self, index: &DatasetIndex, today: &str) -> Result<bool> {
        if index.is_case_study() {
            return Ok(false);
        }

        let previous_day = naming::previous_day(today)?;
        let sampled_current = index
            .indexed_stations()
            .take(self.config.stale_sample_size)
            .any(|station| {
                index
                    .days(station)
                    .first()
                    .is_some_and(|day| *day == previous_day)
            });
        if sampled_current || index.retains_day(&previous_day) {
            return Ok(false);
        }

        let stale = index.snapshot_exists(&previous_day);
        if stale {
            debug!(
                "Index of {} predates the snapshot for {}",
                index.root().display(),
                previous_day
            );
        }
        Ok(stale)
    }

    /// Evict a cached index so the next request opens it afresh
    pub fn remove(&self, dataset: &str, variable: Option<&str>) -> Option<Arc<DatasetIndex>> {
        let key = RegistryKey::new(dataset, variable);
        let removed = self.entries.write().remove(&key);
        if removed.is_some() {
            self.stats.lock().evictions += 1;
            debug!("Evicted index for {}", key);
        }
        removed
    }

    /// Build and persist the snapshot of a finished day for a dataset
    ///
    /// Indexes cached before the snapshot existed are detected as stale by
    /// the next [`get`](Self::get).
    pub fn settle_day(
        &self,
        dataset: &str,
        variable: Option<&str>,
        day: &str,
        today: &str,
    ) -> Result<DayIndex> {
        if !naming::is_day_token(day) {
            return Err(Error::invalid_token("day", day));
        }
        if day >= today {
            return Err(Error::configuration(format!(
                "Day {} has not finished yet (today is {})",
                day, today
            )));
        }

        let index = self.get(dataset, variable, today)?;
        if index.is_vacant() {
            return Err(Error::configuration(format!(
                "Dataset {} has no directory for variable {}",
                dataset,
                variable.unwrap_or_default()
            )));
        }
        let guard = self.build_guard(&RegistryKey::new(dataset, variable));
        let _building = guard.lock();
        index.settle_day(day)
    }

    /// The cached index of a dataset, without a staleness check
    pub fn peek(&self, dataset: &str, variable: Option<&str>) -> Option<Arc<DatasetIndex>> {
        self.cached(&RegistryKey::new(dataset, variable))
    }

    /// Keys with a cached index
    pub fn keys(&self) -> Vec<RegistryKey> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.lock().clone()
    }

    fn cached(&self, key: &RegistryKey) -> Option<Arc<DatasetIndex>> {
        self.entries.read().get(key).cloned()
    }

    fn build_guard(&self, key: &RegistryKey) -> Arc<Mutex<()>> {
        let mut guards = self.build_guards.lock();
        Arc::clone(guards.entry(key.clone()).or_default())
    }
}
