//! Client-side timeout policy (§4.7, `gofer.rmi.policy.Timeout`).

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 3: Internal module imports
use crate::util::time::parse_duration;

/// `(start, duration)` budget for a synchronous call: `start` bounds
/// phase A (waiting for `started`), `duration` bounds phase B (waiting
/// for progress/terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    pub start: Duration,
    pub duration: Duration,
}

impl Timeout {
    /// `Synchronous.TIMEOUT = (10, 90)` in the original.
    pub const DEFAULT: Timeout = Timeout {
        start: Duration::from_secs(10),
        duration: Duration::from_secs(90),
    };

    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    /// Parse both halves from duration strings (seconds, `H:M:S`, or
    /// `10s`/`5m`/`2h`/`1d` shorthand).
    pub fn parse(start: &str, duration: &str) -> Result<Self, crate::util::time::DurationParseError> {
        Ok(Self {
            start: parse_duration(start)?,
            duration: parse_duration(duration)?,
        })
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::DEFAULT
    }
}
