//! Query evaluation
//!
//! Turns a station list, optional variables and a time selection into the
//! ordered list of matching product files. Results are variable-major, then
//! in request station order, then most recent first within each station.

use crate::app::models::{ProductEntry, TimeSelection};
use crate::app::services::dataset_index::{DatasetIndex, StationView};
use crate::app::services::day_index::ProductFile;
use crate::app::services::naming;
use crate::app::services::registry::IndexRegistry;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// A resolved query from the request layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Logical dataset path
    pub dataset: String,

    /// Variables to query; empty for single-product datasets
    #[serde(default)]
    pub variables: Vec<String>,

    /// Stations in the order results should be returned
    pub stations: Vec<String>,

    pub time: TimeSelection,
}

impl QueryRequest {
    pub fn new(
        dataset: impl Into<String>,
        stations: impl IntoIterator<Item = impl Into<String>>,
        time: TimeSelection,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            variables: Vec::new(),
            stations: stations.into_iter().map(Into::into).collect(),
            time,
        }
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variables.push(variable.into());
        self
    }
}

/// Evaluate a query against the registry as of `today`
///
/// An empty result is not an error.
///
/// # Errors
/// * `Error::InvalidToken` or `Error::Configuration` for a malformed time
///   selection
/// * Any error from [`IndexRegistry::get`]
pub fn evaluate(
    registry: &IndexRegistry,
    request: &QueryRequest,
    today: &str,
) -> Result<Vec<ProductEntry>> {
    request.time.validate()?;
    let start = Instant::now();

    let variables: Vec<Option<&str>> = if request.variables.is_empty() {
        vec![None]
    } else {
        request.variables.iter().map(|v| Some(v.as_str())).collect()
    };

    let mut results = Vec::new();
    for variable in variables {
        let index = registry.get(&request.dataset, variable, today)?;
        for station in &request.stations {
            let view = index.query_station(station, today)?;
            collect_matches(&index, &view, variable, &request.time, &mut results);
        }

        if registry.config().release_after_query {
            registry.remove(&request.dataset, variable);
        }
    }

    info!(
        "Query on {} ({} stations) matched {} products in {:?}",
        request.dataset,
        request.stations.len(),
        results.len(),
        start.elapsed()
    );
    Ok(results)
}

/// Append the matches of one station view, most recent first
///
/// Point selections stop at the first match.
pub fn collect_matches(
    index: &DatasetIndex,
    view: &StationView,
    variable: Option<&str>,
    time: &TimeSelection,
    results: &mut Vec<ProductEntry>,
) {
    let all_time = time.is_all_time();
    let (start_day, end_day) = time.day_bounds();
    let (start_stamp, end_stamp) = time.stamp_bounds();
    let before = results.len();

    'days: for day in view.days() {
        if !all_time && !naming::is_valid_day(day, start_day, end_day) {
            continue;
        }

        for file in view.files(day) {
            if !all_time {
                let matches = product_stamp(day, file)
                    .is_some_and(|stamp| naming::is_valid_timestamp(&stamp, start_stamp, end_stamp));
                if !matches {
                    continue;
                }
            }

            results.push(ProductEntry {
                station: view.station().to_string(),
                variable: variable.map(str::to_string),
                day: day.clone(),
                time: file.time.clone(),
                file_name: base_name(&file.file_name).to_string(),
                relative_path: index.relative_path(view.station(), day, &file.file_name),
            });

            if time.is_point() {
                break 'days;
            }
        }
    }

    debug!(
        "Station {} contributed {} matches",
        view.station(),
        results.len() - before
    );
}

/// Normalized `yyyymmdd_hhmm` stamp of a product, if it has one
fn product_stamp(day: &str, file: &ProductFile) -> Option<String> {
    if naming::is_day_token(day) && naming::is_time_token(&file.time) {
        Some(format!("{}_{}", day, file.time))
    } else {
        naming::normalize_stamp(&file.file_name)
    }
}

/// Last `/`-separated segment of a product path
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
