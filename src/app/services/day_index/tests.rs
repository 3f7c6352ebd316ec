//! Tests for day index scanning and snapshot persistence

use super::*;
use crate::Error;
use crate::app::models::{ArchiveLayout, NamingConvention};
use std::fs;
use tempfile::TempDir;

/// Create an empty file, creating parent directories as needed
fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"radar").unwrap();
}

/// Station-first archive with two populated stations and one empty one
fn create_station_day_archive() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for time in ["0000", "0600", "1200"] {
        touch(root, &format!("KFTG/20230102/Level2_KFTG_20230102_{}.ar2v", time));
    }
    touch(root, "KTLX/20230102/Level2_KTLX_20230102_2355.ar2v");
    touch(root, "KTLX/20230101/Level2_KTLX_20230101_0100.ar2v");
    fs::create_dir_all(root.join("KAMA/20230102")).unwrap();

    temp_dir
}

fn build_standard(root: &Path, day: &str) -> DayIndex {
    DayIndex::build(
        root,
        day,
        ArchiveLayout::StationDay,
        NamingConvention::Standard,
        None,
    )
    .unwrap()
}

#[test]
fn test_build_station_day_layout() {
    let temp_dir = create_station_day_archive();
    let index = build_standard(temp_dir.path(), "20230102");

    assert_eq!(index.day(), "20230102");
    assert_eq!(index.station_names().collect::<Vec<_>>(), vec!["KFTG", "KTLX"]);
    assert_eq!(index.times("KFTG"), vec!["1200", "0600", "0000"]);
    assert_eq!(index.times("KTLX"), vec!["2355"]);
    assert_eq!(index.file_count(), 4);

    // Stations with no products that day are omitted
    assert!(!index.contains_station("KAMA"));
    assert!(index.times("KAMA").is_empty());
}

#[test]
fn test_build_missing_day_is_empty() {
    let temp_dir = create_station_day_archive();
    let index = build_standard(temp_dir.path(), "20221231");
    assert!(index.is_empty());

    let missing_root = temp_dir.path().join("nowhere");
    assert!(build_standard(&missing_root, "20230102").is_empty());
}

#[test]
fn test_build_rejects_malformed_day() {
    let temp_dir = create_station_day_archive();
    let result = DayIndex::build(
        temp_dir.path(),
        "2023-01-02",
        ArchiveLayout::StationDay,
        NamingConvention::Standard,
        None,
    );
    assert!(matches!(result, Err(Error::InvalidToken { .. })));
}

#[test]
fn test_unknown_file_tolerance() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "KFTG/20230102/Level2_KFTG_20230102_0635.ar2v");
    touch(root, "KFTG/20230102/.Level2_KFTG_20230102_0640.ar2v.part");

    let index = build_standard(root, "20230102");
    assert_eq!(index.times("KFTG"), vec!["0635"]);
}

#[test]
fn test_unrecognised_names_skipped_in_standard_archives() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "KFTG/20230102/Level2_KFTG_20230102_0635.ar2v");
    touch(root, "KFTG/20230102/README");
    fs::create_dir_all(root.join("KFTG/20230102/subdir")).unwrap();

    let index = build_standard(root, "20230102");
    assert_eq!(index.times("KFTG"), vec!["0635"]);
}

#[test]
fn test_duplicate_time_tokens_keep_greatest_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "KFTG/20230102/Level2_KFTG_20230102_0635.ar2v");
    touch(root, "KFTG/20230102/Level2_KFTG_20230102_063512.ar2v");

    let index = build_standard(root, "20230102");
    let files = index.files("KFTG").unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "Level2_KFTG_20230102_063512.ar2v");
}

#[test]
fn test_build_day_station_layout_with_variable() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "20230102/FTG/N0R/Level3_FTG_N0R_20230102_0100.nids");
    touch(root, "20230102/FTG/N0R/Level3_FTG_N0R_20230102_0200.nids");
    touch(root, "20230102/FTG/N0V/Level3_FTG_N0V_20230102_0300.nids");
    touch(root, "20230102/TLX/N0V/Level3_TLX_N0V_20230102_0300.nids");

    let index = DayIndex::build(
        root,
        "20230102",
        ArchiveLayout::DayStation,
        NamingConvention::Standard,
        Some("N0R"),
    )
    .unwrap();

    assert_eq!(index.station_names().collect::<Vec<_>>(), vec!["FTG"]);
    assert_eq!(index.times("FTG"), vec!["0200", "0100"]);
}

#[test]
fn test_build_raw_naming() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "KFTG/20230102/sweep-b.bin");
    touch(root, "KFTG/20230102/sweep-a.bin");
    touch(root, "KFTG/20230102/.sweep-c.bin");

    let index = DayIndex::build(
        root,
        "20230102",
        ArchiveLayout::StationDay,
        NamingConvention::Raw,
        None,
    )
    .unwrap();
    assert_eq!(index.times("KFTG"), vec!["sweep-b.bin", "sweep-a.bin"]);
}

#[test]
fn test_build_case_study() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    touch(root, "KTLX/KTLX_990503_2201.ar2v");
    touch(root, "KTLX/part2/KTLX_990503_2300.ar2v");
    touch(root, "KTLX/.hidden/KTLX_990503_2310.ar2v");
    touch(root, "KINX/N0R/INX_N0R_990503_2200.nids");

    let index = DayIndex::build_case_study(root, None).unwrap();
    assert_eq!(index.day(), "all");
    assert_eq!(
        index.times("KTLX"),
        vec!["part2/KTLX_990503_2300.ar2v", "KTLX_990503_2201.ar2v"]
    );

    let with_variable = DayIndex::build_case_study(root, Some("N0R")).unwrap();
    assert_eq!(
        with_variable.station_names().collect::<Vec<_>>(),
        vec!["KINX"]
    );
    assert_eq!(with_variable.times("KINX"), vec!["INX_N0R_990503_2200.nids"]);
}

#[test]
fn test_case_study_walk_of_missing_directory_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let files = scan::walk_case_study(&temp_dir.path().join("KTLX").join("N0R")).unwrap();
    assert!(files.is_empty());
}

#[test]
fn test_directory_traversal_error_keeps_source() {
    use std::error::Error as _;

    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("gone");
    let walk_error = walkdir::WalkDir::new(&missing)
        .into_iter()
        .next()
        .unwrap()
        .unwrap_err();

    let error = Error::directory_traversal("Failed to walk case study directory", walk_error);
    assert!(matches!(error, Error::DirectoryTraversal { .. }));
    assert!(error.source().is_some());
    assert!(!error.is_snapshot_corruption());
    assert!(error.to_string().contains("Failed to walk case study directory"));
}

#[test]
fn test_persist_load_round_trip() {
    let temp_dir = create_station_day_archive();
    let built = build_standard(temp_dir.path(), "20230102");

    let path = built.persist().unwrap();
    assert_eq!(path, temp_dir.path().join(".20230102"));
    assert!(path.is_file());

    let loaded = DayIndex::load(&path).unwrap();
    assert_eq!(loaded, built);

    // Snapshots are hidden and never mistaken for station directories
    let rebuilt = build_standard(temp_dir.path(), "20230102");
    assert_eq!(rebuilt, built);
}

#[test]
fn test_persist_replaces_existing_snapshot() {
    let temp_dir = create_station_day_archive();
    let root = temp_dir.path();
    build_standard(root, "20230102").persist().unwrap();

    touch(root, "KFTG/20230102/Level2_KFTG_20230102_1800.ar2v");
    build_standard(root, "20230102").persist().unwrap();

    let loaded = DayIndex::load_day(root, "20230102").unwrap();
    assert_eq!(loaded.times("KFTG"), vec!["1800", "1200", "0600", "0000"]);

    // No temporary files are left behind
    let leftovers: Vec<_> = fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_load_corrupt_snapshot_fails() {
    let temp_dir = create_station_day_archive();
    let path = build_standard(temp_dir.path(), "20230102").persist().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let error = DayIndex::load(&path).unwrap_err();
    assert!(error.is_snapshot_corruption(), "unexpected error: {}", error);
}

#[test]
fn test_load_truncated_and_foreign_snapshots_fail() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::write(root.join(".20230102"), b"RD").unwrap();
    assert!(DayIndex::load_day(root, "20230102")
        .unwrap_err()
        .is_snapshot_corruption());

    fs::write(root.join(".20230103"), b"this is not a snapshot at all").unwrap();
    assert!(DayIndex::load_day(root, "20230103")
        .unwrap_err()
        .is_snapshot_corruption());
}

#[test]
fn test_load_rejects_day_mismatch() {
    let temp_dir = create_station_day_archive();
    let root = temp_dir.path();
    let path = build_standard(root, "20230102").persist().unwrap();
    fs::rename(&path, root.join(".20230105")).unwrap();

    let error = DayIndex::load_day(root, "20230105").unwrap_err();
    assert!(matches!(error, Error::Snapshot { .. }));
}

#[test]
fn test_load_missing_snapshot_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let error = DayIndex::load_day(temp_dir.path(), "20230102").unwrap_err();
    assert!(matches!(error, Error::Io { .. }));
}
