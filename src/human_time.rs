//! Clock-style duration parsing and formatting
//!
//! The CLI takes the mix target length as `M:SS` (for example `5:30`), and log
//! lines report durations the same way.

use crate::{Error, Result};

/// Parse a `M:SS` clock string into milliseconds.
///
/// Minutes are unbounded; seconds must be `0..=59`.
///
/// # Examples
///
/// ```
/// use intromix::human_time::parse_clock;
///
/// assert_eq!(parse_clock("5:30").unwrap(), 330_000);
/// assert_eq!(parse_clock("10:00").unwrap(), 600_000);
/// ```
pub fn parse_clock(input: &str) -> Result<u64> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid duration '{}': expected M:SS, e.g. 5:30",
            input
        )));
    }

    let minutes: u64 = parts[0]
        .parse()
        .map_err(|_| Error::Config(format!("Invalid minutes in duration '{}'", input)))?;
    let seconds: u64 = parts[1]
        .parse()
        .map_err(|_| Error::Config(format!("Invalid seconds in duration '{}'", input)))?;

    if seconds > 59 {
        return Err(Error::Config(format!(
            "Invalid duration '{}': seconds must be 0-59",
            input
        )));
    }

    Ok((minutes * 60 + seconds) * 1000)
}

/// Format milliseconds as a `M:SS` clock string (rounded down to whole seconds).
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_basic() {
        assert_eq!(parse_clock("5:30").unwrap(), 330_000);
        assert_eq!(parse_clock("10:00").unwrap(), 600_000);
        assert_eq!(parse_clock("0:05").unwrap(), 5_000);
        assert_eq!(parse_clock("120:00").unwrap(), 7_200_000);
    }

    #[test]
    fn test_parse_clock_whitespace() {
        assert_eq!(parse_clock(" 2:15 ").unwrap(), 135_000);
    }

    #[test]
    fn test_parse_clock_invalid() {
        assert!(parse_clock("530").is_err());
        assert!(parse_clock("5:3:0").is_err());
        assert!(parse_clock("5:75").is_err());
        assert!(parse_clock("a:30").is_err());
        assert!(parse_clock("5:xx").is_err());
        assert!(parse_clock("").is_err());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(330_000), "5:30");
        assert_eq!(format_clock(600_000), "10:00");
        assert_eq!(format_clock(5_000), "0:05");
        assert_eq!(format_clock(5_999), "0:05");
    }

    #[test]
    fn test_roundtrip() {
        for ms in [0, 1_000, 59_000, 60_000, 330_000, 3_599_000] {
            assert_eq!(parse_clock(&format_clock(ms)).unwrap(), ms);
        }
    }
}
