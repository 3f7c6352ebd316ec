//! Directory scanning for day indexes
//!
//! Builds [`DayIndex`] instances by listing the archive tree. Missing
//! directories are "no data", never errors; a single unreadable or
//! unrecognised entry is skipped without aborting the rest of the scan.

use super::{DayIndex, ProductFile, normalize_products};
use crate::app::models::{ArchiveLayout, NamingConvention};
use crate::app::services::naming::{self, NameKind};
use crate::constants::CASE_STUDY_DAY;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Subdirectory names of `dir` with the given classification, ascending
///
/// A missing directory yields an empty list.
pub(crate) fn list_subdirs(dir: &Path, kind: NameKind) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(Error::io(
                format!("Failed to list directory {}", dir.display()),
                e,
            ));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if !entry.path().is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if naming::classify(&name) == kind {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Product files in one station/day directory, most recent first
///
/// Hidden files, subdirectories and names the convention does not
/// recognise are skipped. A missing or unreadable directory yields nothing.
pub fn scan_products(dir: &Path, convention: NamingConvention) -> Vec<ProductFile> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Failed to scan {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        if !entry.path().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        match convention.time_token(&file_name) {
            Some(time) => files.push(ProductFile { time, file_name }),
            None => debug!("Skipping unrecognised file {}/{}", dir.display(), file_name),
        }
    }

    normalize_products(&mut files);
    files
}

impl DayIndex {
    /// Build the index of one day by scanning the archive
    ///
    /// For station-first layouts every station directory under `root` is
    /// visited and its `{day}` subdirectory scanned; for day-first layouts
    /// the stations under `{root}/{day}` are visited (descending into the
    /// variable subdirectory when one is given). Stations without products
    /// are omitted.
    pub fn build(
        root: &Path,
        day: &str,
        layout: ArchiveLayout,
        convention: NamingConvention,
        variable: Option<&str>,
    ) -> Result<Self> {
        if !layout.is_case_study() && !naming::is_day_token(day) {
            return Err(Error::invalid_token("day", day));
        }

        let start = Instant::now();
        let mut stations = BTreeMap::new();

        match layout {
            ArchiveLayout::StationDay => {
                for station in list_subdirs(root, NameKind::Named)? {
                    let dir = root.join(&station).join(day);
                    stations.insert(station, scan_products(&dir, convention));
                }
            }
            ArchiveLayout::DayStation => {
                let day_dir = root.join(day);
                for station in list_subdirs(&day_dir, NameKind::Named)? {
                    let mut dir = day_dir.join(&station);
                    if let Some(variable) = variable {
                        dir.push(variable);
                    }
                    stations.insert(station, scan_products(&dir, convention));
                }
            }
            ArchiveLayout::StationVariable => return Self::build_case_study(root, variable),
        }

        let index = Self::from_parts(root, day, stations);
        debug!(
            "Scanned day {} under {}: {} stations, {} files in {:?}",
            day,
            root.display(),
            index.station_count(),
            index.file_count(),
            start.elapsed()
        );
        Ok(index)
    }

    /// Build the single sentinel-day index of a case study archive
    ///
    /// Every file found recursively under `{root}/{station}[/{variable}]`
    /// belongs to the sentinel day; its time token is the path relative to
    /// that directory.
    pub fn build_case_study(root: &Path, variable: Option<&str>) -> Result<Self> {
        let start = Instant::now();
        let mut stations = BTreeMap::new();

        for station in list_subdirs(root, NameKind::Named)? {
            let mut base = root.join(&station);
            if let Some(variable) = variable {
                base.push(variable);
            }
            stations.insert(station, walk_case_study(&base)?);
        }

        let index = Self::from_parts(root, CASE_STUDY_DAY, stations);
        debug!(
            "Scanned case study {}: {} stations, {} files in {:?}",
            root.display(),
            index.station_count(),
            index.file_count(),
            start.elapsed()
        );
        Ok(index)
    }
}

/// Recursive listing of one case study station directory
///
/// A missing directory yields nothing. Failing to read `base` itself is an
/// error; unreadable entries below it are skipped.
pub(crate) fn walk_case_study(base: &Path) -> Result<Vec<ProductFile>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(base)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(naming::is_hidden));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                if e.io_error().is_some_and(|io| io.kind() == ErrorKind::NotFound) {
                    return Ok(Vec::new());
                }
                return Err(Error::directory_traversal(
                    format!("Failed to walk case study directory {}", base.display()),
                    e,
                ));
            }
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", base.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        let Some(parts) = parts else {
            continue;
        };
        let token = parts.join("/");
        files.push(ProductFile::new(token.clone(), token));
    }

    Ok(files)
}
