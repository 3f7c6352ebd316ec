//! Per-day station index
//!
//! A [`DayIndex`] records, for one calendar day of one archive root, which
//! product files each station has. It is built once (by directory scan or by
//! reading a persisted snapshot) and is immutable afterwards; a rebuild
//! always produces a new instance.

use crate::app::services::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod scan;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use scan::scan_products;

/// One product file within a station/day directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFile {
    /// Time token: `hhmm`, or the raw file name for non-standard archives
    pub time: String,

    /// File name on disk (or `/`-separated relative path in case studies)
    pub file_name: String,
}

impl ProductFile {
    pub fn new(time: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            file_name: file_name.into(),
        }
    }
}

/// Sort product files most recent first, leaving one file per time token
///
/// When two files share a time token the lexicographically greatest name
/// is kept, so the result does not depend on directory listing order.
pub fn normalize_products(files: &mut Vec<ProductFile>) {
    files.sort_by(|a, b| {
        naming::compare_descending(&a.time, &b.time)
            .then_with(|| naming::compare_descending(&a.file_name, &b.file_name))
    });
    files.dedup_by(|later, earlier| later.time == earlier.time);
}

/// Index of one day for one archive root: station -> descending product list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayIndex {
    /// Day token, or the case study sentinel
    day: String,

    /// Directory the snapshot lives in (the scanned root unless relocated)
    root: PathBuf,

    /// Station name -> product files, strictly descending by time token
    stations: BTreeMap<String, Vec<ProductFile>>,
}

impl DayIndex {
    /// Assemble an index from raw per-station lists
    ///
    /// Lists are normalized and stations without products are dropped.
    pub fn from_parts(
        root: impl Into<PathBuf>,
        day: impl Into<String>,
        stations: impl IntoIterator<Item = (String, Vec<ProductFile>)>,
    ) -> Self {
        let stations = stations
            .into_iter()
            .filter_map(|(station, mut files)| {
                normalize_products(&mut files);
                (!files.is_empty()).then_some((station, files))
            })
            .collect();

        Self {
            day: day.into(),
            root: root.into(),
            stations,
        }
    }

    /// Move the directory this index persists its snapshot into
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn day(&self) -> &str {
        &self.day
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Station names in ascending order
    pub fn station_names(&self) -> impl Iterator<Item = &str> {
        self.stations.keys().map(String::as_str)
    }

    pub fn contains_station(&self, station: &str) -> bool {
        self.stations.contains_key(station)
    }

    /// Product files of a station, most recent first
    pub fn files(&self, station: &str) -> Option<&[ProductFile]> {
        self.stations.get(station).map(Vec::as_slice)
    }

    /// Time tokens of a station, most recent first
    pub fn times(&self, station: &str) -> Vec<&str> {
        self.files(station)
            .map(|files| files.iter().map(|f| f.time.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Total number of product files across all stations
    pub fn file_count(&self) -> usize {
        self.stations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Where this day's snapshot lives: `{root}/.{day}`
    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.root, &self.day)
    }

    pub(crate) fn stations(&self) -> &BTreeMap<String, Vec<ProductFile>> {
        &self.stations
    }
}

/// Snapshot location for a day under an archive root
pub fn snapshot_path(root: &Path, day: &str) -> PathBuf {
    root.join(naming::snapshot_file_name(day))
}
