//! Dataset index build statistics

use std::time::Duration;

/// Statistics about opening one dataset index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenStats {
    /// Days read from an intact snapshot
    pub snapshots_loaded: usize,

    /// Days built by directory scan because no snapshot existed
    pub snapshots_built: usize,

    /// Days rebuilt by scan because their snapshot was corrupt
    pub snapshots_recovered: usize,

    /// Snapshots that could not be written (the index still holds them)
    pub persist_failures: usize,

    /// Stations with at least one retained product
    pub stations: usize,

    /// Retained day tokens, most recent first
    pub retained_days: Vec<String>,

    /// Time taken to open the index
    pub open_duration: Duration,
}

impl OpenStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of days held in memory
    pub fn days_retained(&self) -> usize {
        self.retained_days.len()
    }

    /// Check whether any snapshot needed recovery or could not be written
    pub fn has_problems(&self) -> bool {
        self.snapshots_recovered > 0 || self.persist_failures > 0
    }

    /// Get a summary string of the open
    pub fn summary(&self) -> String {
        format!(
            "{} days retained ({} loaded, {} built, {} recovered), {} stations in {:.2}s",
            self.days_retained(),
            self.snapshots_loaded,
            self.snapshots_built,
            self.snapshots_recovered,
            self.stations,
            self.open_duration.as_secs_f64()
        )
    }
}
