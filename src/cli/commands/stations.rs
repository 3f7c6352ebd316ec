//! Stations command implementation
//!
//! Opens a dataset index and lists its stations, optionally with the days
//! retained for each.

use super::shared::{CommandStats, open_registry, print_json, setup_logging};
use crate::app::services::dataset_index::DatasetIndex;
use crate::cli::args::{OutputFormat, StationsArgs};
use anyhow::{Context, Result};
use colored::*;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info};

/// Stations command runner
pub fn run_stations(args: StationsArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.common);
    debug!("Stations arguments: {:?}", args);

    let today = args.common.resolve_today()?;
    let registry = open_registry(&args.common)?;
    let index = registry
        .get(&args.dataset, args.variable.as_deref(), &today)
        .with_context(|| format!("Failed to open dataset '{}'", args.dataset))?;

    let stations = index.stations();
    info!("Dataset {} has {} stations", args.dataset, stations.len());

    match args.common.output_format {
        OutputFormat::Human => print_human(&args, &index, &stations),
        OutputFormat::Json => print_json(&json!({
            "dataset": args.dataset,
            "variable": args.variable,
            "layout": index.layout().as_str(),
            "naming": index.naming().to_string(),
            "case_study": index.is_case_study(),
            "retained_days": index.retained_days(),
            "stations": stations
                .iter()
                .map(|station| if args.detailed {
                    json!({ "station": station, "days": index.days(station) })
                } else {
                    json!(station)
                })
                .collect::<Vec<_>>(),
        }))?,
    }

    Ok(CommandStats {
        items_reported: stations.len(),
        elapsed: start_time.elapsed(),
    })
}

fn print_human(args: &StationsArgs, index: &DatasetIndex, stations: &[String]) {
    let stats = index.stats();
    println!(
        "{} {}{}",
        "Dataset:".bold(),
        args.dataset,
        args.variable
            .as_deref()
            .map(|v| format!(" [{}]", v))
            .unwrap_or_default()
    );
    println!("{} {}", "Root:".bold(), index.root().display());
    println!(
        "{} {} ({} naming{})",
        "Layout:".bold(),
        index.layout(),
        index.naming(),
        if index.is_case_study() { ", case study" } else { "" }
    );
    println!("{} {}", "Index:".bold(), stats.summary());
    if stats.has_problems() {
        println!(
            "{}",
            format!(
                "{} snapshots recovered, {} could not be written (see log)",
                stats.snapshots_recovered, stats.persist_failures
            )
            .yellow()
        );
    }
    println!();

    if stations.is_empty() {
        println!("{}", "No stations found".yellow());
        return;
    }

    for station in stations {
        if args.detailed {
            let days = index.days(station);
            let days = if days.is_empty() {
                "no retained days".dimmed().to_string()
            } else {
                days.join(" ")
            };
            println!("  {:<6} {}", station.green(), days);
        } else {
            println!("  {}", station.green());
        }
    }
    println!("\n{} stations", stations.len().to_string().bold());
}
