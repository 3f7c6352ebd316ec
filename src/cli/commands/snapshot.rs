//! Snapshot command implementation
//!
//! Settles a finished day by writing its snapshot. Intended to run from a
//! scheduler once the upstream feed has delivered the day's last files.

use super::shared::{CommandStats, create_spinner, open_registry, print_json, setup_logging};
use crate::cli::args::{OutputFormat, SnapshotArgs};
use anyhow::{Context, Result};
use colored::*;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info};

/// Snapshot command runner
pub fn run_snapshot(args: SnapshotArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.common);
    debug!("Snapshot arguments: {:?}", args);

    let today = args.common.resolve_today()?;
    let day = args.resolve_day(&today)?;
    let registry = open_registry(&args.common)?;

    let spinner = args
        .common
        .show_progress()
        .then(|| create_spinner(&format!("Indexing {} for {}...", args.dataset, day)));

    let result = registry.settle_day(&args.dataset, args.variable.as_deref(), &day, &today);
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    let settled =
        result.with_context(|| format!("Failed to settle {} for dataset '{}'", day, args.dataset))?;

    info!(
        "Settled {} for {}: {} stations, {} files",
        day,
        args.dataset,
        settled.station_count(),
        settled.file_count()
    );

    match args.common.output_format {
        OutputFormat::Human => {
            println!(
                "{} {} {}",
                "Settled".green().bold(),
                day,
                settled.snapshot_path().display()
            );
            println!(
                "  {} stations, {} files in {:.2}s",
                settled.station_count(),
                settled.file_count(),
                start_time.elapsed().as_secs_f64()
            );
        }
        OutputFormat::Json => print_json(&json!({
            "dataset": args.dataset,
            "variable": args.variable,
            "day": day,
            "snapshot": settled.snapshot_path(),
            "stations": settled.station_count(),
            "files": settled.file_count(),
        }))?,
    }

    Ok(CommandStats {
        items_reported: settled.file_count(),
        elapsed: start_time.elapsed(),
    })
}
