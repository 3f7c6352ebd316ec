//! Per-query projection of a dataset index onto one station

use crate::app::services::day_index::ProductFile;
use crate::app::services::naming;
use std::collections::HashMap;

/// Days and product files of one station, most recent first
///
/// Built fresh for every query by merging retained snapshots with a live scan
/// of the days still receiving data. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationView {
    station: String,
    days: Vec<String>,
    files: HashMap<String, Vec<ProductFile>>,
}

impl StationView {
    /// A view with no data
    pub fn empty(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            days: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Assemble a view from `(day, files)` pairs
    ///
    /// Pairs are taken in priority order: when a day appears twice the first
    /// occurrence wins. Days without files are dropped.
    pub fn from_days(
        station: impl Into<String>,
        days: impl IntoIterator<Item = (String, Vec<ProductFile>)>,
    ) -> Self {
        let mut view = Self::empty(station);
        for (day, files) in days {
            if files.is_empty() || view.files.contains_key(&day) {
                continue;
            }
            view.days.push(day.clone());
            view.files.insert(day, files);
        }
        naming::sort_descending(&mut view.days);
        view
    }

    pub fn station(&self) -> &str {
        &self.station
    }

    /// Day tokens with data, most recent first
    pub fn days(&self) -> &[String] {
        &self.days
    }

    /// Product files of one day, most recent first
    pub fn files(&self, day: &str) -> &[ProductFile] {
        self.files.get(day).map(Vec::as_slice).unwrap_or_default()
    }

    /// Time tokens of one day, most recent first
    pub fn times(&self, day: &str) -> Vec<&str> {
        self.files(day).iter().map(|f| f.time.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}
