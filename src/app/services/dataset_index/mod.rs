//! Dataset index service
//!
//! A [`DatasetIndex`] caches the recent history of one logical dataset: one
//! archive root plus an optional variable. It retains the most recent
//! settled days as [`DayIndex`] snapshots, knows the archive's physical
//! layout, and answers per-station queries by merging that history with a
//! live scan of the days still receiving data.
//!
//! Days are classified relative to the caller's `today`:
//! - days before yesterday are *settled*: built once, persisted as a
//!   snapshot and loaded from it on later opens;
//! - yesterday is *unsettled* until its snapshot appears (written by
//!   [`DatasetIndex::settle_day`]); until then it is scanned live;
//! - today is always scanned live.

use crate::app::models::{ArchiveLayout, NamingConvention};
use crate::app::services::day_index::scan::list_subdirs;
use crate::app::services::day_index::{DayIndex, scan_products, snapshot_path};
use crate::app::services::naming::{self, NameKind};
use crate::constants::{
    CASE_STUDY_DAY, DEFAULT_CASE_STUDY_MARKER, DEFAULT_DAYS_TO_READ, VARIABLE_SNAPSHOT_DIR_PREFIX,
};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod layout;
pub mod station_view;
pub mod stats;


pub use station_view::StationView;
pub use stats::OpenStats;

/// Caller-supplied knowledge about a dataset's layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutHints {
    /// Force a layout instead of probing the archive
    pub layout: Option<ArchiveLayout>,

    /// Force a naming convention instead of sampling file names
    pub naming: Option<NamingConvention>,

    /// Number of settled days to retain
    pub days_to_read: usize,

    /// Path segment marker identifying case study archives
    pub case_study_marker: String,
}

impl Default for LayoutHints {
    fn default() -> Self {
        Self {
            layout: None,
            naming: None,
            days_to_read: DEFAULT_DAYS_TO_READ,
            case_study_marker: DEFAULT_CASE_STUDY_MARKER.to_string(),
        }
    }
}

impl LayoutHints {
    pub fn with_layout(mut self, layout: ArchiveLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = Some(naming);
        self
    }

    pub fn with_days_to_read(mut self, days: usize) -> Self {
        self.days_to_read = days;
        self
    }

    pub fn with_case_study_marker(mut self, marker: impl Into<String>) -> Self {
        self.case_study_marker = marker.into();
        self
    }
}

/// Cached index of one dataset (archive root plus optional variable)
///
/// Immutable once opened; a rebuild produces a new instance.
#[derive(Debug)]
pub struct DatasetIndex {
    /// Dataset archive root; result paths are relative to it
    root: PathBuf,

    /// Directory holding the station or day directories
    base: PathBuf,

    /// Directory holding the day snapshots
    snapshot_dir: PathBuf,

    variable: Option<String>,
    layout: ArchiveLayout,
    naming: NamingConvention,
    days_to_read: usize,

    /// Day token the index was opened for
    opened_on: String,

    /// The variable has no directory in the archive; nothing is indexed
    vacant: bool,

    /// Retained day indexes, most recent first
    retained: Vec<DayIndex>,

    /// Station -> retained days with data, most recent first
    station_days: BTreeMap<String, Vec<String>>,

    stats: OpenStats,
}

impl DatasetIndex {
    /// Open the index of a dataset as of `today`
    ///
    /// Probes the layout once, then loads (or builds and persists) the most
    /// recent `days_to_read` settled days. Case study archives are scanned
    /// in full into the sentinel day instead.
    ///
    /// A variable without any directory in the archive opens a vacant
    /// index: empty, and nothing is persisted for it.
    ///
    /// # Errors
    /// * `Error::InvalidToken` if `today` is not a day token, or `variable`
    ///   is not a plain directory name
    /// * `Error::Io` if the archive root is missing or cannot be listed
    pub fn open(
        root: &Path,
        variable: Option<&str>,
        hints: &LayoutHints,
        today: &str,
    ) -> Result<Self> {
        let start = Instant::now();
        naming::parse_day(today)?;
        if let Some(variable) = variable {
            naming::check_segment("variable", variable)?;
        }

        let resolved = layout::resolve(root, variable, hints)?;
        let vacant = match variable {
            Some(variable) => !layout::variable_present(&resolved, variable)?,
            None => false,
        };
        let naming = hints
            .naming
            .unwrap_or_else(|| layout::probe_naming(&resolved.base, resolved.layout));
        let snapshot_dir = match (resolved.layout, variable) {
            (ArchiveLayout::DayStation, Some(variable)) => {
                root.join(format!("{}{}", VARIABLE_SNAPSHOT_DIR_PREFIX, variable))
            }
            _ => resolved.base.clone(),
        };

        let mut index = Self {
            root: root.to_path_buf(),
            base: resolved.base,
            snapshot_dir,
            variable: variable.map(str::to_string),
            layout: resolved.layout,
            naming,
            days_to_read: hints.days_to_read.max(1),
            opened_on: today.to_string(),
            vacant,
            retained: Vec::new(),
            station_days: BTreeMap::new(),
            stats: OpenStats::new(),
        };

        if index.vacant {
            warn!(
                "Variable {} has no directory under {}; index is empty",
                variable.unwrap_or_default(),
                root.display()
            );
        } else if index.layout.is_case_study() {
            let case_study = DayIndex::build_case_study(&index.base, variable)?;
            index.retained.push(case_study);
        } else {
            index.load_history(today)?;
        }

        index.aggregate();
        index.stats.open_duration = start.elapsed();
        info!(
            "Opened {} index for {}{}: {}",
            index.layout,
            index.root.display(),
            index
                .variable
                .as_deref()
                .map(|v| format!(" [{}]", v))
                .unwrap_or_default(),
            index.stats.summary()
        );
        Ok(index)
    }

    /// Load or build the retained settled days
    fn load_history(&mut self, today: &str) -> Result<()> {
        let yesterday = naming::previous_day(today)?;
        let snapshots = self.snapshot_days();

        // Yesterday only counts once its snapshot exists
        let mut candidates: BTreeSet<String> = self
            .archive_days()?
            .into_iter()
            .filter(|day| day.as_str() < yesterday.as_str())
            .collect();
        candidates.extend(
            snapshots
                .iter()
                .filter(|day| day.as_str() < today)
                .cloned(),
        );

        let days: Vec<String> = candidates
            .into_iter()
            .rev()
            .take(self.days_to_read)
            .collect();

        for day in days {
            let index = if snapshots.contains(&day) {
                match DayIndex::load_day(&self.snapshot_dir, &day) {
                    Ok(index) => {
                        self.stats.snapshots_loaded += 1;
                        index
                    }
                    Err(e) => {
                        warn!("Snapshot for {} unusable, rebuilding by scan: {}", day, e);
                        self.stats.snapshots_recovered += 1;
                        self.build_and_persist(&day)?
                    }
                }
            } else {
                self.stats.snapshots_built += 1;
                self.build_and_persist(&day)?
            };
            self.retained.push(index);
        }

        Ok(())
    }

    /// Build one day by scan and try to persist it
    ///
    /// A failed write is logged and counted; the index is kept in memory.
    fn build_and_persist(&mut self, day: &str) -> Result<DayIndex> {
        let index = self.build_day(day)?;
        if let Err(e) = self.persist_day(&index) {
            warn!("Failed to persist snapshot for {}: {}", day, e);
            self.stats.persist_failures += 1;
        }
        Ok(index)
    }

    fn build_day(&self, day: &str) -> Result<DayIndex> {
        let index = DayIndex::build(
            &self.base,
            day,
            self.layout,
            self.naming,
            self.variable.as_deref(),
        )?;
        Ok(index.with_root(&self.snapshot_dir))
    }

    fn persist_day(&self, index: &DayIndex) -> Result<PathBuf> {
        if self.snapshot_dir != self.base {
            fs::create_dir_all(&self.snapshot_dir).map_err(|e| {
                Error::io(
                    format!(
                        "Failed to create snapshot directory {}",
                        self.snapshot_dir.display()
                    ),
                    e,
                )
            })?;
        }
        index.persist()
    }

    /// Build and persist the snapshot of a finished day
    ///
    /// Writing the snapshot is what marks the day settled; indexes opened
    /// before it existed become stale once it appears.
    pub fn settle_day(&self, day: &str) -> Result<DayIndex> {
        if self.is_case_study() {
            return Err(Error::configuration(format!(
                "Case study archive {} has no days to settle",
                self.root.display()
            )));
        }
        if self.vacant {
            return Err(Error::configuration(format!(
                "Variable {} has no directory under {}",
                self.variable.as_deref().unwrap_or_default(),
                self.root.display()
            )));
        }
        let index = self.build_day(day)?;
        let path = self.persist_day(&index)?;
        info!(
            "Settled day {} at {} ({} stations, {} files)",
            day,
            path.display(),
            index.station_count(),
            index.file_count()
        );
        Ok(index)
    }

    /// Rebuild the station -> days aggregate from the retained indexes
    fn aggregate(&mut self) {
        self.station_days.clear();
        for index in &self.retained {
            for station in index.station_names() {
                self.station_days
                    .entry(station.to_string())
                    .or_default()
                    .push(index.day().to_string());
            }
        }
        for days in self.station_days.values_mut() {
            naming::sort_descending(days);
        }

        self.stats.stations = self.station_days.len();
        self.stats.retained_days = self.retained.iter().map(|i| i.day().to_string()).collect();
    }

    /// Day tokens that have a snapshot file
    fn snapshot_days(&self) -> BTreeSet<String> {
        let entries = match fs::read_dir(&self.snapshot_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(
                        "Failed to list snapshots in {}: {}",
                        self.snapshot_dir.display(),
                        e
                    );
                }
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| {
                let name = e.file_name();
                naming::day_of_snapshot_file(name.to_str()?).map(str::to_string)
            })
            .collect()
    }

    /// Day tokens with a directory anywhere in the archive
    fn archive_days(&self) -> Result<BTreeSet<String>> {
        let mut days = BTreeSet::new();
        match self.layout {
            ArchiveLayout::StationDay => {
                for station in list_subdirs(&self.base, NameKind::Named)? {
                    days.extend(list_subdirs(&self.base.join(station), NameKind::Day)?);
                }
            }
            ArchiveLayout::DayStation => {
                days.extend(list_subdirs(&self.base, NameKind::Day)?);
            }
            ArchiveLayout::StationVariable => {}
        }
        Ok(days)
    }

    /// Assemble the view of one station as of `today`
    ///
    /// Retained history is merged with a live scan of today and of any day
    /// newer than the newest retained one. Unknown stations yield an empty
    /// view.
    pub fn query_station(&self, station: &str, today: &str) -> Result<StationView> {
        naming::check_segment("station", station)?;
        if self.vacant {
            return Ok(StationView::empty(station));
        }
        if self.is_case_study() {
            let files = self
                .retained
                .first()
                .and_then(|index| index.files(station))
                .map(<[_]>::to_vec)
                .unwrap_or_default();
            return Ok(StationView::from_days(
                station,
                [(CASE_STUDY_DAY.to_string(), files)],
            ));
        }

        if !naming::is_day_token(today) {
            return Err(Error::invalid_token("day", today));
        }

        let live_days = self.live_days(station, today);
        if live_days.len() > 2 {
            debug!(
                "Station {} scans {} days live; the newest settled day is {}",
                station,
                live_days.len(),
                self.retained.first().map(DayIndex::day).unwrap_or("none")
            );
        }

        let mut days = Vec::new();
        for day in live_days {
            let files = scan_products(&self.day_dir(station, &day), self.naming);
            days.push((day, files));
        }
        for index in &self.retained {
            if let Some(files) = index.files(station) {
                days.push((index.day().to_string(), files.to_vec()));
            }
        }

        let view = StationView::from_days(station, days);
        debug!(
            "Station {} view: {} days, {} files",
            station,
            view.days().len(),
            view.file_count()
        );
        Ok(view)
    }

    /// Days of `station` to scan live: today plus anything newer than history
    fn live_days(&self, station: &str, today: &str) -> Vec<String> {
        let newest = self.retained.first().map(DayIndex::day);
        let listed = match self.layout {
            ArchiveLayout::StationDay => list_subdirs(&self.base.join(station), NameKind::Day),
            _ => list_subdirs(&self.base, NameKind::Day),
        };
        let listed = listed.unwrap_or_else(|e| {
            warn!("Live scan of {} failed: {}", station, e);
            Vec::new()
        });

        let mut days: Vec<String> = listed
            .into_iter()
            .filter(|day| day.as_str() <= today)
            .filter(|day| newest.is_none_or(|newest| day.as_str() > newest))
            .collect();
        days.push(today.to_string());
        naming::sort_descending(&mut days);
        days.truncate(self.days_to_read + 1);
        days
    }

    /// Directory holding one station's products for one day
    fn day_dir(&self, station: &str, day: &str) -> PathBuf {
        match self.layout {
            ArchiveLayout::DayStation => {
                let mut dir = self.base.join(day).join(station);
                if let Some(variable) = &self.variable {
                    dir.push(variable);
                }
                dir
            }
            _ => self.base.join(station).join(day),
        }
    }

    /// `/`-separated path of a product relative to the dataset root
    pub fn relative_path(&self, station: &str, day: &str, file_name: &str) -> String {
        let variable = self.variable.as_deref();
        let parts: Vec<&str> = match self.layout {
            ArchiveLayout::StationDay => {
                let prefix = if self.base != self.root { variable } else { None };
                prefix.into_iter().chain([station, day, file_name]).collect()
            }
            ArchiveLayout::DayStation => [day, station]
                .into_iter()
                .chain(variable)
                .chain([file_name])
                .collect(),
            ArchiveLayout::StationVariable => [station]
                .into_iter()
                .chain(variable)
                .chain([file_name])
                .collect(),
        };
        parts.join("/")
    }

    /// Stations known to the index, ascending
    ///
    /// Includes stations with retained history and, for station-first
    /// layouts, every station directory currently on disk.
    pub fn stations(&self) -> Vec<String> {
        let mut stations: BTreeSet<String> = self.station_days.keys().cloned().collect();
        if self.layout.is_station_first() && !self.vacant {
            match list_subdirs(&self.base, NameKind::Named) {
                Ok(names) => stations.extend(names),
                Err(e) => warn!("Failed to list stations in {}: {}", self.base.display(), e),
            }
        }
        stations.into_iter().collect()
    }

    /// Retained days with data for a station, most recent first
    pub fn days(&self, station: &str) -> &[String] {
        self.station_days
            .get(station)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stations with retained history, ascending
    pub fn indexed_stations(&self) -> impl Iterator<Item = &str> {
        self.station_days.keys().map(String::as_str)
    }

    /// Retained day tokens, most recent first
    pub fn retained_days(&self) -> Vec<&str> {
        self.retained.iter().map(DayIndex::day).collect()
    }

    pub fn retains_day(&self, day: &str) -> bool {
        self.retained.iter().any(|index| index.day() == day)
    }

    /// The retained index of one day
    pub fn day_index(&self, day: &str) -> Option<&DayIndex> {
        self.retained.iter().find(|index| index.day() == day)
    }

    /// Whether a snapshot file for `day` exists on disk now
    pub fn snapshot_exists(&self, day: &str) -> bool {
        snapshot_path(&self.snapshot_dir, day).is_file()
    }

    /// Whether the variable was absent from the archive when opened
    pub fn is_vacant(&self) -> bool {
        self.vacant
    }

    pub fn is_case_study(&self) -> bool {
        self.layout.is_case_study()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub fn layout(&self) -> ArchiveLayout {
        self.layout
    }

    pub fn naming(&self) -> NamingConvention {
        self.naming
    }

    pub fn opened_on(&self) -> &str {
        &self.opened_on
    }

    pub fn stats(&self) -> &OpenStats {
        &self.stats
    }
}
