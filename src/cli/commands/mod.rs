//! Command implementations for the radar index CLI
//!
//! Each subcommand lives in its own module:
//! - `query`: product listing for stations in a time window
//! - `stations`: station listing for a dataset
//! - `snapshot`: settling a finished day

pub mod query;
pub mod shared;
pub mod snapshot;
pub mod stations;

pub use shared::CommandStats;

use crate::cli::args::Commands;
use anyhow::Result;

/// Dispatch to the handler of the selected subcommand
pub fn run(command: Commands) -> Result<CommandStats> {
    match command {
        Commands::Query(args) => query::run_query(args),
        Commands::Stations(args) => stations::run_stations(args),
        Commands::Snapshot(args) => snapshot::run_snapshot(args),
    }
}
