//! Archive layout detection
//!
//! Probes a dataset root once, at open time, to decide which physical
//! layout it uses and which naming convention its files follow. The result
//! is carried by the index so queries never re-probe.

use super::LayoutHints;
use crate::app::models::{ArchiveLayout, NamingConvention};
use crate::app::services::day_index::scan::list_subdirs;
use crate::app::services::naming::{self, NameKind};
use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Number of product files sampled when inferring the naming convention
const NAMING_PROBE_FILES: usize = 32;

/// Layout decision for one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedLayout {
    pub layout: ArchiveLayout,

    /// Directory holding station (or day) directories and the snapshots
    pub base: PathBuf,
}

/// Decide the layout of `root`, honouring any explicit hint
///
/// Day-shaped first-level directories mean day-first. Otherwise, a station
/// directory holding day-shaped subdirectories means station-first (under
/// `{root}/{variable}` when that exists). Failing both, a root whose path
/// carries the case study marker is a case study; anything else is treated
/// as a station-first archive that has not received data yet.
pub(crate) fn resolve(
    root: &Path,
    variable: Option<&str>,
    hints: &LayoutHints,
) -> Result<ResolvedLayout> {
    if !root.is_dir() {
        return Err(Error::io(
            format!("Archive root is not a directory: {}", root.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "archive root not found"),
        ));
    }

    // Station-first variables live under `{root}/{variable}`, present or not
    let variable_base = variable.map(|v| root.join(v));

    if let Some(layout) = hints.layout {
        let base = match layout {
            ArchiveLayout::StationDay => variable_base.unwrap_or_else(|| root.to_path_buf()),
            ArchiveLayout::DayStation | ArchiveLayout::StationVariable => root.to_path_buf(),
        };
        debug!("Using configured layout {} for {}", layout, base.display());
        return Ok(ResolvedLayout { layout, base });
    }

    if !list_subdirs(root, NameKind::Day)?.is_empty() {
        return Ok(ResolvedLayout {
            layout: ArchiveLayout::DayStation,
            base: root.to_path_buf(),
        });
    }

    let base = variable_base.unwrap_or_else(|| root.to_path_buf());
    for station in list_subdirs(&base, NameKind::Named)? {
        if !list_subdirs(&base.join(&station), NameKind::Day)?.is_empty() {
            debug!(
                "Station {} has day directories; {} is station-first",
                station,
                base.display()
            );
            return Ok(ResolvedLayout {
                layout: ArchiveLayout::StationDay,
                base,
            });
        }
    }

    if has_case_study_marker(root, &hints.case_study_marker) {
        return Ok(ResolvedLayout {
            layout: ArchiveLayout::StationVariable,
            base: root.to_path_buf(),
        });
    }

    Ok(ResolvedLayout {
        layout: ArchiveLayout::StationDay,
        base,
    })
}

/// Whether the archive holds a directory for `variable` at all
///
/// Station-day archives need `{base}`, day-station archives some
/// `{day}/{station}/{variable}` leaf and case studies some
/// `{station}/{variable}` directory.
pub(crate) fn variable_present(resolved: &ResolvedLayout, variable: &str) -> Result<bool> {
    let base = &resolved.base;
    match resolved.layout {
        ArchiveLayout::StationDay => Ok(base.is_dir()),
        ArchiveLayout::DayStation => {
            for day in list_subdirs(base, NameKind::Day)?.iter().rev() {
                let day_dir = base.join(day);
                for station in list_subdirs(&day_dir, NameKind::Named)? {
                    if day_dir.join(station).join(variable).is_dir() {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
        ArchiveLayout::StationVariable => Ok(list_subdirs(base, NameKind::Named)?
            .iter()
            .any(|station| base.join(station).join(variable).is_dir())),
    }
}

/// Whether any path segment contains the marker (case-insensitive)
pub(crate) fn has_case_study_marker(root: &Path, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    let marker = marker.to_lowercase();
    root.components().any(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .is_some_and(|s| s.to_lowercase().contains(&marker)),
        _ => false,
    })
}

/// Infer the naming convention from a sample of product files
///
/// Any standard-stamped file makes the archive standard; a sample with
/// files but no stamps makes it raw. An empty archive defaults to standard.
pub(crate) fn probe_naming(base: &Path, layout: ArchiveLayout) -> NamingConvention {
    if layout.is_case_study() {
        return NamingConvention::Raw;
    }

    let mut sampled = 0;
    let walker = WalkDir::new(base)
        .min_depth(1)
        .max_depth(4)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(naming::is_hidden))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file());

    for entry in walker.take(NAMING_PROBE_FILES) {
        sampled += 1;
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if naming::extract_time_token(name).is_some() {
            return NamingConvention::Standard;
        }
    }

    if sampled > 0 {
        debug!(
            "No stamped names among {} sampled files under {}; using raw naming",
            sampled,
            base.display()
        );
        NamingConvention::Raw
    } else {
        NamingConvention::Standard
    }
}
