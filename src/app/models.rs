//! Data models for radar archive indexing
//!
//! This module contains the core domain types shared by the index services:
//! the physical layout variants of an archive, the file naming conventions,
//! the caller's time selection and the product entries returned by queries.

use crate::app::services::naming;
use crate::constants::{EPOCH_STAMP, FAR_FUTURE_STAMP};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Archive Layout
// =============================================================================

/// Physical directory layout of one dataset
///
/// Determined once when a dataset index is opened and carried thereafter,
/// so queries never re-probe the directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveLayout {
    /// `{root}/{station}/{yyyymmdd}/{file}` (real-time, station first)
    StationDay,
    /// `{root}/{yyyymmdd}/{station}/[{variable}/]{file}` (real-time, day first)
    DayStation,
    /// `{root}/{station}/[{variable}/]{file...}` (case study, no day partition)
    StationVariable,
}

impl ArchiveLayout {
    /// Case study archives bucket every file under the sentinel day
    pub fn is_case_study(&self) -> bool {
        matches!(self, ArchiveLayout::StationVariable)
    }

    /// Whether first-level directories are stations
    pub fn is_station_first(&self) -> bool {
        !matches!(self, ArchiveLayout::DayStation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveLayout::StationDay => "station-day",
            ArchiveLayout::DayStation => "day-station",
            ArchiveLayout::StationVariable => "station-variable",
        }
    }
}

impl FromStr for ArchiveLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "station-day" | "station/day/time" => Ok(ArchiveLayout::StationDay),
            "day-station" | "day/station/time" => Ok(ArchiveLayout::DayStation),
            "station-variable" | "station/variable/time" | "case-study" => {
                Ok(ArchiveLayout::StationVariable)
            }
            _ => Err(Error::configuration(format!(
                "Invalid archive layout '{}': must be station-day, day-station or station-variable",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ArchiveLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Naming Convention
// =============================================================================

/// How time tokens are derived from product file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    /// `*_yyyymmdd_hhmm.*`; the time token is the captured `hhmm`
    Standard,
    /// Any other naming; the whole file name is the time token
    Raw,
}

impl NamingConvention {
    /// Derive the time token for a file, or `None` if the file is skipped
    pub fn time_token(&self, file_name: &str) -> Option<String> {
        if naming::is_hidden(file_name) || file_name.is_empty() {
            return None;
        }
        match self {
            NamingConvention::Standard => naming::extract_time_token(file_name),
            NamingConvention::Raw => Some(file_name.to_string()),
        }
    }
}

impl FromStr for NamingConvention {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(NamingConvention::Standard),
            "raw" => Ok(NamingConvention::Raw),
            _ => Err(Error::configuration(format!(
                "Invalid naming convention '{}': must be standard or raw",
                s
            ))),
        }
    }
}

impl std::fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingConvention::Standard => f.write_str("standard"),
            NamingConvention::Raw => f.write_str("raw"),
        }
    }
}

// =============================================================================
// Time Selection
// =============================================================================

/// Time selection supplied by the query layer
///
/// Stamps are pre-normalized `yyyymmdd_hhmm` strings in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSelection {
    /// Every product, epoch to present
    AllTime,
    /// The most recent product per station
    Latest,
    /// The product stamped at exactly this minute, first match per station
    Point(String),
    /// Inclusive stamp range
    Range { start: String, end: String },
}

impl TimeSelection {
    /// Point selection for a UTC instant
    pub fn point_at(time: DateTime<Utc>) -> Self {
        TimeSelection::Point(naming::stamp_of(&time))
    }

    /// Range selection between two UTC instants
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeSelection::Range {
            start: naming::stamp_of(&start),
            end: naming::stamp_of(&end),
        }
    }

    /// Check the stamps are well formed and ordered
    pub fn validate(&self) -> Result<()> {
        match self {
            TimeSelection::AllTime | TimeSelection::Latest => Ok(()),
            TimeSelection::Point(stamp) => {
                if naming::is_stamp(stamp) {
                    Ok(())
                } else {
                    Err(Error::invalid_token("stamp", stamp.clone()))
                }
            }
            TimeSelection::Range { start, end } => {
                for stamp in [start, end] {
                    if !naming::is_stamp(stamp) {
                        return Err(Error::invalid_token("stamp", stamp.clone()));
                    }
                }
                if start > end {
                    return Err(Error::configuration(format!(
                        "Time range start {} is after end {}",
                        start, end
                    )));
                }
                Ok(())
            }
        }
    }

    /// No day or timestamp filtering applies
    pub fn is_all_time(&self) -> bool {
        matches!(self, TimeSelection::AllTime | TimeSelection::Latest)
    }

    /// Stop at the first match per station
    pub fn is_point(&self) -> bool {
        matches!(self, TimeSelection::Point(_) | TimeSelection::Latest)
    }

    /// Inclusive `(start, end)` stamps
    pub fn stamp_bounds(&self) -> (&str, &str) {
        match self {
            TimeSelection::AllTime | TimeSelection::Latest => (EPOCH_STAMP, FAR_FUTURE_STAMP),
            TimeSelection::Point(stamp) => (stamp.as_str(), stamp.as_str()),
            TimeSelection::Range { start, end } => (start.as_str(), end.as_str()),
        }
    }

    /// Inclusive `(start, end)` day tokens
    pub fn day_bounds(&self) -> (&str, &str) {
        let (start, end) = self.stamp_bounds();
        (naming::day_of_stamp(start), naming::day_of_stamp(end))
    }
}

// =============================================================================
// Product Entry
// =============================================================================

/// One matching product file, as returned to the query layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    /// Station identifier as requested
    pub station: String,

    /// Variable subdirectory, if the dataset has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// Day token, or the case study sentinel
    pub day: String,

    /// Time token (`hhmm`, or a raw file name)
    pub time: String,

    /// Product file name on disk
    pub file_name: String,

    /// Path relative to the dataset's archive root, `/`-separated
    pub relative_path: String,
}

impl ProductEntry {
    /// Observation time recovered from the file's naming stamp
    pub fn observation_time(&self) -> Option<DateTime<Utc>> {
        let stamp = if naming::is_time_token(&self.time) && naming::is_day_token(&self.day) {
            format!("{}_{}", self.day, self.time)
        } else {
            naming::normalize_stamp(&self.time)?
        };
        naming::parse_stamp(&stamp)
    }

    /// Observation time as an ISO-8601 string, if known
    pub fn observation_time_iso(&self) -> Option<String> {
        self.observation_time()
            .map(|time| time.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }
}
