//! Duration parsing shared by window specs (§6 `H:M:S` or seconds) and
//! client timeouts (gofer-style `10s`/`5m`/`2h`/`1d` suffixes, see
//! `original_source/src/gofer/rmi/policy.py::Timeout.seconds`).

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
// (none)

use thiserror::Error;

/// Error returned when a duration string cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid duration: {0:?}")]
pub struct DurationParseError(pub String);

/// Parse a duration given as either:
/// - a plain integer number of seconds (`"60"`),
/// - an `H:M:S` clock string (`"0:01:00"`), or
/// - a suffixed shorthand (`"60s"`, `"5m"`, `"2h"`, `"1d"`).
///
/// # Example
///
/// ```rust
/// use fleetrpc::util::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
/// assert_eq!(parse_duration("1:00:00").unwrap(), Duration::from_secs(3600));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// ```
pub fn parse_duration(spec: &str) -> Result<Duration, DurationParseError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(DurationParseError(spec.to_string()));
    }
    if spec.contains(':') {
        return parse_clock(spec);
    }
    if let Some(seconds) = parse_suffixed(spec) {
        return Ok(Duration::from_secs(seconds));
    }
    spec.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| DurationParseError(spec.to_string()))
}

fn parse_clock(spec: &str) -> Result<Duration, DurationParseError> {
    let parts: Vec<&str> = spec.split(':').collect();
    let err = || DurationParseError(spec.to_string());
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (
            h.parse::<u64>().map_err(|_| err())?,
            m.parse::<u64>().map_err(|_| err())?,
            s.parse::<u64>().map_err(|_| err())?,
        ),
        [m, s] => (
            0,
            m.parse::<u64>().map_err(|_| err())?,
            s.parse::<u64>().map_err(|_| err())?,
        ),
        _ => return Err(err()),
    };
    Ok(Duration::from_secs(h * 3600 + m * 60 + s))
}

fn parse_suffixed(spec: &str) -> Option<u64> {
    let (digits, multiplier) = match spec.chars().last()? {
        's' => (&spec[..spec.len() - 1], 1),
        'm' => (&spec[..spec.len() - 1], 60),
        'h' => (&spec[..spec.len() - 1], 60 * 60),
        'd' => (&spec[..spec.len() - 1], 24 * 60 * 60),
        _ => return None,
    };
    digits.parse::<u64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_duration("42").unwrap(), Duration::from_secs(42));
    }

    #[test]
    fn parses_hms() {
        assert_eq!(parse_duration("1:02:03").unwrap(), Duration::from_secs(3723));
    }

    #[test]
    fn parses_ms() {
        assert_eq!(parse_duration("2:03").unwrap(), Duration::from_secs(123));
    }

    #[test]
    fn parses_suffixes() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
    }
}
