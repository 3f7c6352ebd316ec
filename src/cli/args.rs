//! Command-line argument definitions for the radar index
//!
//! This module defines the CLI interface using the clap derive API. Every
//! subcommand shares the configuration, logging, output and clock options
//! in [`CommonArgs`].

use crate::app::models::TimeSelection;
use crate::app::services::naming;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the radar archive index
///
/// Answers "which product files exist for these stations in this window"
/// over a station/day organised radar archive, using cached day snapshots.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "radar-index",
    version,
    about = "Index and query time-stamped radar product archives",
    long_about = "Discovers radar product files in archives organised by station and day. \
                  Settled days are cached as binary snapshots next to the data, so queries \
                  only scan the directories still receiving files."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List product files for stations in a time window
    Query(QueryArgs),
    /// List the stations of a dataset
    Stations(StationsArgs),
    /// Write the snapshot of a finished day
    Snapshot(SnapshotArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Path to configuration file
    ///
    /// TOML configuration mapping dataset paths to archive roots. If not
    /// specified, looks for <config dir>/radar-index/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,

    /// Day to treat as today (UTC)
    ///
    /// Defaults to the current UTC date. Useful for replaying an archive.
    #[arg(long = "today", value_name = "YYYYMMDD", help = "Override the current UTC day")]
    pub today: Option<String>,
}

/// Arguments for the query command
#[derive(Debug, Clone, Parser)]
pub struct QueryArgs {
    /// Logical dataset path as configured, e.g. nexrad/level2/IDD
    #[arg(short = 'd', long = "dataset", value_name = "PATH")]
    pub dataset: String,

    /// Variable subdirectory; repeat for several variables
    #[arg(long = "var", value_name = "VAR")]
    pub variables: Vec<String>,

    /// Station to query; repeat for several stations, results keep this order
    #[arg(short = 's', long = "station", value_name = "STN", required = true)]
    pub stations: Vec<String>,

    /// Single time point as yyyymmdd_hhmm
    #[arg(
        long = "time",
        value_name = "STAMP",
        conflicts_with_all = ["latest", "start", "end"]
    )]
    pub time: Option<String>,

    /// Most recent product per station
    #[arg(long = "latest", conflicts_with_all = ["start", "end"])]
    pub latest: bool,

    /// Range start as yyyymmdd_hhmm
    #[arg(long = "start", value_name = "STAMP", requires = "end")]
    pub start: Option<String>,

    /// Range end as yyyymmdd_hhmm
    #[arg(long = "end", value_name = "STAMP", requires = "start")]
    pub end: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the stations command
#[derive(Debug, Clone, Parser)]
pub struct StationsArgs {
    /// Logical dataset path as configured
    #[arg(short = 'd', long = "dataset", value_name = "PATH")]
    pub dataset: String,

    /// Variable subdirectory
    #[arg(long = "var", value_name = "VAR")]
    pub variable: Option<String>,

    /// Include each station's retained days
    #[arg(long = "detailed", help = "Show retained days per station")]
    pub detailed: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Arguments for the snapshot command
#[derive(Debug, Clone, Parser)]
pub struct SnapshotArgs {
    /// Logical dataset path as configured
    #[arg(short = 'd', long = "dataset", value_name = "PATH")]
    pub dataset: String,

    /// Variable subdirectory
    #[arg(long = "var", value_name = "VAR")]
    pub variable: Option<String>,

    /// Day to settle; defaults to yesterday
    #[arg(long = "day", value_name = "YYYYMMDD")]
    pub day: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
}

impl Args {
    /// Shared options of the selected subcommand
    pub fn common(&self) -> Option<&CommonArgs> {
        self.command.as_ref().map(Commands::common)
    }
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Query(args) => &args.common,
            Commands::Stations(args) => &args.common,
            Commands::Snapshot(args) => &args.common,
        }
    }
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress spinners (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }

    /// The day token to treat as today
    pub fn resolve_today(&self) -> Result<String> {
        match &self.today {
            Some(day) => {
                naming::parse_day(day)?;
                Ok(day.clone())
            }
            None => Ok(naming::today_utc()),
        }
    }
}

impl QueryArgs {
    /// The time selection described by the flags (all time by default)
    pub fn time_selection(&self) -> Result<TimeSelection> {
        let selection = match (&self.time, self.latest, &self.start, &self.end) {
            (Some(stamp), _, _, _) => TimeSelection::Point(stamp.clone()),
            (None, true, _, _) => TimeSelection::Latest,
            (None, false, Some(start), Some(end)) => TimeSelection::Range {
                start: start.clone(),
                end: end.clone(),
            },
            (None, false, None, None) => TimeSelection::AllTime,
            _ => {
                return Err(Error::configuration(
                    "--start and --end must be given together",
                ));
            }
        };
        selection.validate()?;
        Ok(selection)
    }
}

impl SnapshotArgs {
    /// The day to settle: explicit, or the day before `today`
    pub fn resolve_day(&self, today: &str) -> Result<String> {
        match &self.day {
            Some(day) => {
                naming::parse_day(day)?;
                Ok(day.clone())
            }
            None => naming::previous_day(today),
        }
    }
}
