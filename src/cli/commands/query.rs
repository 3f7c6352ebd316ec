//! Query command implementation
//!
//! Evaluates a station/time query and prints the matching product files.

use super::shared::{CommandStats, open_registry, print_json, setup_logging};
use crate::app::models::ProductEntry;
use crate::app::services::query::{QueryRequest, evaluate};
use crate::cli::args::{OutputFormat, QueryArgs};
use anyhow::{Context, Result};
use colored::*;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info};

/// Query command runner
pub fn run_query(args: QueryArgs) -> Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.common);
    debug!("Query arguments: {:?}", args);

    let today = args.common.resolve_today()?;
    let registry = open_registry(&args.common)?;

    let mut request = QueryRequest::new(&args.dataset, &args.stations, args.time_selection()?);
    request.variables = args.variables.clone();

    info!(
        "Querying {} for {} stations as of {}",
        request.dataset,
        request.stations.len(),
        today
    );
    let results = evaluate(&registry, &request, &today)
        .with_context(|| format!("Query on dataset '{}' failed", request.dataset))?;

    match args.common.output_format {
        OutputFormat::Human => print_human(&request, &results),
        OutputFormat::Json => print_json(&json!({
            "dataset": request.dataset,
            "today": today,
            "time": request.time,
            "count": results.len(),
            "products": results
                .iter()
                .map(|entry| json!({
                    "station": entry.station,
                    "variable": entry.variable,
                    "day": entry.day,
                    "time": entry.time,
                    "file_name": entry.file_name,
                    "path": entry.relative_path,
                    "observed": entry.observation_time_iso(),
                }))
                .collect::<Vec<_>>(),
        }))?,
    }

    Ok(CommandStats {
        items_reported: results.len(),
        elapsed: start_time.elapsed(),
    })
}

fn print_human(request: &QueryRequest, results: &[ProductEntry]) {
    println!(
        "{} {} ({} stations)",
        "Dataset:".bold(),
        request.dataset,
        request.stations.len()
    );

    if results.is_empty() {
        println!("{}", "No matching products".yellow());
        return;
    }

    let mut current_station: Option<(&str, Option<&str>)> = None;
    for entry in results {
        let group = (entry.station.as_str(), entry.variable.as_deref());
        if current_station != Some(group) {
            match entry.variable.as_deref() {
                Some(variable) => println!("\n{} [{}]", entry.station.green().bold(), variable),
                None => println!("\n{}", entry.station.green().bold()),
            }
            current_station = Some(group);
        }

        let observed = entry
            .observation_time_iso()
            .unwrap_or_else(|| "-".to_string());
        println!("  {}  {}", observed.cyan(), entry.relative_path);
    }

    println!("\n{} products", results.len().to_string().bold());
}
