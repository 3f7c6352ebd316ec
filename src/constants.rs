//! Application constants for the radar index
//!
//! This module contains default values, archive naming conventions and
//! snapshot format constants used throughout the crate.

// =============================================================================
// Archive Naming Conventions
// =============================================================================

/// Sentinel day token for flat, non-day-partitioned (case study) archives
pub const CASE_STUDY_DAY: &str = "all";

/// Default path-segment marker identifying a case study archive
pub const DEFAULT_CASE_STUDY_MARKER: &str = "casestudy";

/// Prefix of hidden per-day snapshot files (`{root}/.{yyyymmdd}`)
pub const SNAPSHOT_PREFIX: &str = ".";

/// Hidden directory holding per-variable snapshots of day-first archives
/// (`{root}/.index-{variable}/.{yyyymmdd}`)
pub const VARIABLE_SNAPSHOT_DIR_PREFIX: &str = ".index-";

/// Length of a `yyyymmdd` day token
pub const DAY_TOKEN_LEN: usize = 8;

/// Length of a standard `hhmm` time token
pub const TIME_TOKEN_LEN: usize = 4;

/// Two-digit years at or above this pivot are 19xx, below it 20xx
pub const TWO_DIGIT_YEAR_PIVOT: u32 = 70;

// =============================================================================
// Index Defaults
// =============================================================================

/// Number of most recent historical days retained per dataset index
pub const DEFAULT_DAYS_TO_READ: usize = 6;

/// Number of stations sampled when checking an index for staleness
pub const DEFAULT_STALE_SAMPLE_SIZE: usize = 10;

/// Lower bound of an all-time query (the epoch as a normalized stamp)
pub const EPOCH_STAMP: &str = "19700101_0000";

/// Upper bound of an all-time query
pub const FAR_FUTURE_STAMP: &str = "99991231_2359";

// =============================================================================
// Snapshot Format
// =============================================================================

/// Magic bytes at the head of every snapshot file
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"RDIX";

/// Snapshot format version; bump on any payload layout change
pub const SNAPSHOT_VERSION: u16 = 1;

/// Fixed header size: magic + version + crc32 + payload length
pub const SNAPSHOT_HEADER_LEN: usize = 4 + 2 + 4 + 4;

// =============================================================================
// Configuration
// =============================================================================

/// Directory name used under the user config dir
pub const CONFIG_DIR_NAME: &str = "radar-index";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment filter target for logging
pub const LOG_TARGET: &str = "radar_index";
