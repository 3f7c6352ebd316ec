//! Archive naming rules
//!
//! Pure functions recognising day tokens (`yyyymmdd`), time tokens (`hhmm`)
//! and normalized stamps (`yyyymmdd_hhmm`), plus the descending comparator
//! that orders every day and time list in the index.
//!
//! All comparisons are lexicographic on fixed-width digit strings, which is
//! also numerically correct.

use crate::constants::{
    DAY_TOKEN_LEN, SNAPSHOT_PREFIX, TIME_TOKEN_LEN, TWO_DIGIT_YEAR_PIVOT,
};
use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Standard product stamp: `yyyymmdd_hhmm`, capturing day and time
static STANDARD_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})_(\d{4})").expect("valid stamp regex"));

/// Legacy product stamp with a two-digit year: `yymmdd_hhmm`
static LEGACY_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{6})_(\d{4})").expect("valid legacy regex"));

/// Classification of one directory or file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// Dot-prefixed; snapshots and editor droppings
    Hidden,
    /// `yyyymmdd`
    Day,
    /// Anything else: a station or variable depending on depth
    Named,
}

/// Classify a directory or file name
pub fn classify(name: &str) -> NameKind {
    if is_hidden(name) {
        NameKind::Hidden
    } else if is_day_token(name) {
        NameKind::Day
    } else {
        NameKind::Named
    }
}

fn all_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// True iff `s` is exactly eight digits
pub fn is_day_token(s: &str) -> bool {
    all_digits(s, DAY_TOKEN_LEN)
}

/// True iff `s` is exactly four digits
pub fn is_time_token(s: &str) -> bool {
    all_digits(s, TIME_TOKEN_LEN)
}

/// True iff `s` is a normalized `yyyymmdd_hhmm` stamp
pub fn is_stamp(s: &str) -> bool {
    match s.split_once('_') {
        Some((day, time)) => is_day_token(day) && is_time_token(time),
        None => false,
    }
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// True iff `name` can only ever denote one visible entry of a directory
///
/// Rejects empty names, separators, `.`/`..` and dot-prefixed names.
pub fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && !is_hidden(name) && !name.contains(['/', '\\', '\0'])
}

/// Reject caller-supplied station or variable names that are not plain
/// path segments
pub fn check_segment(kind: &'static str, name: &str) -> Result<()> {
    if is_plain_segment(name) {
        Ok(())
    } else {
        Err(Error::invalid_token(kind, name))
    }
}

/// Extract the `hhmm` from a standard-named product file
///
/// Returns `None` when the name does not carry a `yyyymmdd_hhmm` stamp; the
/// caller decides whether to fall back to the raw file name.
pub fn extract_time_token(file_name: &str) -> Option<String> {
    STANDARD_STAMP
        .captures(file_name)
        .map(|caps| caps[2].to_string())
}

/// Reverse lexicographic order: most recent first
pub fn compare_descending(a: &str, b: &str) -> Ordering {
    b.cmp(a)
}

/// Sort descending and drop duplicates, leaving a strictly descending list
pub fn sort_descending(tokens: &mut Vec<String>) {
    tokens.sort_by(|a, b| compare_descending(a, b));
    tokens.dedup();
}

/// Day filter; the case study sentinel always passes
pub fn is_valid_day(day: &str, start_day: &str, end_day: &str) -> bool {
    if day == crate::constants::CASE_STUDY_DAY {
        return true;
    }
    start_day <= day && day <= end_day
}

/// Normalize a product token into a `yyyymmdd_hhmm` stamp
///
/// Accepts both eight-digit-year and legacy six-digit-year names. Two-digit
/// years at or above 70 are 19xx, otherwise 20xx.
pub fn normalize_stamp(token: &str) -> Option<String> {
    if let Some(caps) = STANDARD_STAMP.captures(token) {
        return Some(format!("{}_{}", &caps[1], &caps[2]));
    }

    let caps = LEGACY_STAMP.captures(token)?;
    let short = &caps[1];
    let year: u32 = short[..2].parse().ok()?;
    let century = if year >= TWO_DIGIT_YEAR_PIVOT { "19" } else { "20" };
    Some(format!("{}{}_{}", century, short, &caps[2]))
}

/// Inclusive stamp filter; tokens without a recognisable stamp never match
pub fn is_valid_timestamp(token: &str, start_stamp: &str, end_stamp: &str) -> bool {
    match normalize_stamp(token) {
        Some(stamp) => start_stamp <= stamp.as_str() && stamp.as_str() <= end_stamp,
        None => false,
    }
}

/// Day part of a stamp (the stamp itself if it is shorter)
pub fn day_of_stamp(stamp: &str) -> &str {
    stamp.get(..DAY_TOKEN_LEN).unwrap_or(stamp)
}

/// Format a UTC instant as a stamp, truncated to the minute
pub fn stamp_of(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d_%H%M").to_string()
}

/// Parse a normalized stamp back into a UTC instant
pub fn parse_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a day token into a calendar date
pub fn parse_day(day: &str) -> Result<NaiveDate> {
    if !is_day_token(day) {
        return Err(Error::invalid_token("day", day));
    }
    NaiveDate::parse_from_str(day, "%Y%m%d").map_err(|_| Error::invalid_token("day", day))
}

/// The day token before `day`
pub fn previous_day(day: &str) -> Result<String> {
    let date = parse_day(day)?;
    let previous = date
        .checked_sub_signed(Duration::days(1))
        .ok_or_else(|| Error::invalid_token("day", day))?;
    Ok(previous.format("%Y%m%d").to_string())
}

/// Today's UTC day token
pub fn today_utc() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

/// Snapshot file name for a day: `.{yyyymmdd}`
pub fn snapshot_file_name(day: &str) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, day)
}

/// Day token of a snapshot file name, if it is one
pub fn day_of_snapshot_file(name: &str) -> Option<&str> {
    name.strip_prefix(SNAPSHOT_PREFIX)
        .filter(|day| is_day_token(day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_and_time_tokens() {
        assert!(is_day_token("20230102"));
        assert!(!is_day_token("2023012"));
        assert!(!is_day_token("2023010a"));
        assert!(!is_day_token("202301020"));
        assert!(is_time_token("0000"));
        assert!(!is_time_token("000"));
        assert!(is_stamp("20230102_2359"));
        assert!(!is_stamp("20230102-2359"));
        assert!(!is_stamp("20230102_235"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(".20230102"), NameKind::Hidden);
        assert_eq!(classify("20230102"), NameKind::Day);
        assert_eq!(classify("KFTG"), NameKind::Named);
        assert_eq!(classify("N0R"), NameKind::Named);
    }

    #[test]
    fn test_extract_time_token() {
        assert_eq!(
            extract_time_token("Level2_KFTG_20100121_0635.ar2v"),
            Some("0635".to_string())
        );
        assert_eq!(
            extract_time_token("Level3_FTG_N0R_20100121_2359.nids"),
            Some("2359".to_string())
        );
        assert_eq!(extract_time_token("KFTG20100121_063512"), Some("0635".to_string()));
        assert_eq!(extract_time_token("notes.txt"), None);
        assert_eq!(extract_time_token("KFTG_100121_0635"), None);
    }

    #[test]
    fn test_compare_descending() {
        let mut days = vec![
            "20230101".to_string(),
            "20230103".to_string(),
            "20230102".to_string(),
            "20230103".to_string(),
        ];
        sort_descending(&mut days);
        assert_eq!(days, vec!["20230103", "20230102", "20230101"]);
        assert_eq!(compare_descending("0600", "1200"), Ordering::Greater);
    }

    #[test]
    fn test_is_valid_day() {
        assert!(is_valid_day("20230102", "20230101", "20230103"));
        assert!(is_valid_day("20230101", "20230101", "20230101"));
        assert!(!is_valid_day("20221231", "20230101", "20230103"));
        assert!(!is_valid_day("20230104", "20230101", "20230103"));
        // Case study sentinel ignores the window entirely
        assert!(is_valid_day("all", "20230101", "20230101"));
    }

    #[test]
    fn test_normalize_stamp_two_digit_years() {
        assert_eq!(
            normalize_stamp("KTLX_990503_2201.nids").as_deref(),
            Some("19990503_2201")
        );
        assert_eq!(
            normalize_stamp("KTLX_700101_0000").as_deref(),
            Some("19700101_0000")
        );
        assert_eq!(
            normalize_stamp("KTLX_690101_0000").as_deref(),
            Some("20690101_0000")
        );
        assert_eq!(
            normalize_stamp("KTLX_050829_1200").as_deref(),
            Some("20050829_1200")
        );
        assert_eq!(
            normalize_stamp("Level2_KTLX_20050829_1200.ar2v").as_deref(),
            Some("20050829_1200")
        );
        assert_eq!(normalize_stamp("sweep.bin"), None);
    }

    #[test]
    fn test_is_valid_timestamp() {
        assert!(is_valid_timestamp(
            "20230102_1200",
            "20230102_0000",
            "20230102_2359"
        ));
        assert!(is_valid_timestamp(
            "20230102_0000",
            "20230102_0000",
            "20230102_0000"
        ));
        assert!(!is_valid_timestamp(
            "20230103_0000",
            "20230102_0000",
            "20230102_2359"
        ));
        assert!(!is_valid_timestamp("no-stamp", "19700101_0000", "99991231_2359"));
    }

    #[test]
    fn test_plain_segments() {
        assert!(is_plain_segment("KFTG"));
        assert!(is_plain_segment("N0R"));
        for name in ["", ".", "..", ".index-N0R", "../../x", "N0R/FTG", "a\\b"] {
            assert!(!is_plain_segment(name), "{name:?} accepted");
        }
        assert!(matches!(
            check_segment("variable", "../../../outside"),
            Err(Error::InvalidToken { kind: "variable", .. })
        ));
    }

    #[test]
    fn test_day_arithmetic() {
        assert_eq!(previous_day("20230301").unwrap(), "20230228");
        assert_eq!(previous_day("20240301").unwrap(), "20240229");
        assert_eq!(previous_day("20230101").unwrap(), "20221231");
        assert!(previous_day("2023-01-01").is_err());
        assert!(previous_day("20231301").is_err());
        assert_eq!(today_utc().len(), 8);
    }

    #[test]
    fn test_stamps_round_trip_through_chrono() {
        let time = Utc.with_ymd_and_hms(2010, 1, 21, 6, 35, 0).unwrap();
        assert_eq!(stamp_of(&time), "20100121_0635");
        assert_eq!(parse_stamp("20100121_0635"), Some(time));
        assert_eq!(parse_stamp("20101321_0635"), None);
        assert_eq!(day_of_stamp("20100121_0635"), "20100121");
    }

    #[test]
    fn test_snapshot_file_names() {
        assert_eq!(snapshot_file_name("20230102"), ".20230102");
        assert_eq!(day_of_snapshot_file(".20230102"), Some("20230102"));
        assert_eq!(day_of_snapshot_file(".tmpXYZ"), None);
        assert_eq!(day_of_snapshot_file("20230102"), None);
    }
}
