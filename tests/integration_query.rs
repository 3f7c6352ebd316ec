//! Integration tests for registry-backed query evaluation
//!
//! These tests build real archive trees in temporary directories and drive
//! the public API from configuration through to product listings.

use radar_index::config::DatasetConfig;
use radar_index::{
    DatasetIndex, DayIndex, IndexConfig, IndexRegistry, LayoutHints, QueryRequest, TimeSelection,
    evaluate,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const LEVEL2: &str = "nexrad/level2/IDD";
const LEVEL3: &str = "nexrad/level3/IDD";

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"radar").unwrap();
}

/// Level 2 (station first) and level 3 (variable, station, day) archives
fn create_archives(temp_dir: &TempDir) -> IndexRegistry {
    let level2 = temp_dir.path().join("level2");
    let level3 = temp_dir.path().join("level3");

    for day in ["20230101", "20230102", "20230103", "20230104", "20230105"] {
        for time in ["0004", "0602", "1201", "1803"] {
            touch(&level2, &format!("KFTG/{day}/Level2_KFTG_{day}_{time}.ar2v"));
        }
        touch(&level2, &format!("KTLX/{day}/Level2_KTLX_{day}_2358.ar2v"));
        touch(
            &level3,
            &format!("N0R/FTG/{day}/Level3_FTG_N0R_{day}_1200.nids"),
        );
    }

    let config = IndexConfig::default()
        .with_dataset(DatasetConfig::new(LEVEL2, level2))
        .with_dataset(DatasetConfig::new(LEVEL3, level3));
    IndexRegistry::new(config).unwrap()
}

#[test]
fn test_end_to_end_range_query() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_archives(&temp_dir);

    let request = QueryRequest::new(
        LEVEL2,
        ["KTLX", "KFTG"],
        TimeSelection::Range {
            start: "20230103_1200".into(),
            end: "20230104_0700".into(),
        },
    );
    let results = evaluate(&registry, &request, "20230105").unwrap();

    let paths: Vec<&str> = results.iter().map(|e| e.relative_path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "KTLX/20230103/Level2_KTLX_20230103_2358.ar2v",
            "KFTG/20230104/Level2_KFTG_20230104_0602.ar2v",
            "KFTG/20230104/Level2_KFTG_20230104_0004.ar2v",
            "KFTG/20230103/Level2_KFTG_20230103_1803.ar2v",
            "KFTG/20230103/Level2_KFTG_20230103_1201.ar2v",
        ]
    );
    assert_eq!(
        results[0].observation_time_iso().as_deref(),
        Some("2023-01-03T23:58:00Z")
    );
}

#[test]
fn test_staleness_protocol_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_archives(&temp_dir);
    let today = "20230105";

    let before = registry.get(LEVEL2, None, today).unwrap();
    assert!(!before.retains_day("20230104"));

    // Late data for yesterday is visible before settling, via the live scan
    touch(
        &temp_dir.path().join("level2"),
        "KTLX/20230104/Level2_KTLX_20230104_2359.ar2v",
    );
    let latest = QueryRequest::new(LEVEL2, ["KTLX"], TimeSelection::Point("20230104_2359".into()));
    assert_eq!(evaluate(&registry, &latest, today).unwrap().len(), 1);

    registry.settle_day(LEVEL2, None, "20230104", today).unwrap();
    assert!(registry.is_stale(&before, today).unwrap());

    let after = registry.get(LEVEL2, None, today).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.retains_day("20230104"));
    assert_eq!(after.days("KTLX")[0], "20230104");
    assert!(!registry.is_stale(&after, today).unwrap());
    assert_eq!(evaluate(&registry, &latest, today).unwrap().len(), 1);
}

#[test]
fn test_variable_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_archives(&temp_dir);

    let request =
        QueryRequest::new(LEVEL3, ["FTG"], TimeSelection::AllTime).with_variable("N0R");
    let results = evaluate(&registry, &request, "20230105").unwrap();

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|e| e.variable.as_deref() == Some("N0R")));
    assert_eq!(
        results[0].relative_path,
        "N0R/FTG/20230105/Level3_FTG_N0R_20230105_1200.nids"
    );

    // A variable with no directory is simply empty
    let missing = QueryRequest::new(LEVEL3, ["FTG"], TimeSelection::AllTime).with_variable("N0V");
    assert!(evaluate(&registry, &missing, "20230105").unwrap().is_empty());
}

#[test]
fn test_snapshots_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("level2");
    create_archives(&temp_dir);

    let first = DatasetIndex::open(&root, None, &LayoutHints::default(), "20230105").unwrap();
    assert_eq!(first.stats().snapshots_built, 3);

    // Deleting a settled day's files does not change the restarted index
    fs::remove_dir_all(root.join("KFTG/20230102")).unwrap();
    let second = DatasetIndex::open(&root, None, &LayoutHints::default(), "20230105").unwrap();
    assert_eq!(second.stats().snapshots_loaded, 3);
    assert_eq!(
        second.day_index("20230102").unwrap().times("KFTG"),
        vec!["1803", "1201", "0602", "0004"]
    );
    assert_eq!(
        DayIndex::load_day(&root, "20230102").unwrap(),
        *second.day_index("20230102").unwrap()
    );
}

#[test]
fn test_concurrent_queries_share_one_index() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_archives(&temp_dir);
    let request = QueryRequest::new(LEVEL2, ["KFTG", "KTLX"], TimeSelection::Latest);

    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| evaluate(&registry, &request, "20230105").unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(counts.iter().all(|&count| count == 2));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.stats().builds, 1);
}

#[test]
fn test_config_file_drives_registry() {
    let temp_dir = TempDir::new().unwrap();
    create_archives(&temp_dir);
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "days_to_read = 2\n\n[[datasets]]\npath = \"{}\"\nroot = \"{}\"\nlayout = \"station-day\"\n",
            LEVEL2,
            temp_dir.path().join("level2").display()
        ),
    )
    .unwrap();

    let registry = IndexRegistry::new(IndexConfig::load(Some(&config_path)).unwrap()).unwrap();
    let index = registry.get(LEVEL2, None, "20230105").unwrap();
    assert_eq!(index.retained_days(), vec!["20230103", "20230102"]);

    let unknown = QueryRequest::new(LEVEL3, ["FTG"], TimeSelection::Latest);
    assert!(evaluate(&registry, &unknown, "20230105").is_err());
}
