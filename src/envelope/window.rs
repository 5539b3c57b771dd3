//! Request execution window (§3 "Window", §4.3).

// Layer 1: Standard library imports
use std::time::Duration as StdDuration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// A time interval during which a request is eligible to execute.
///
/// `begin` is the earliest instant the request may run; `duration` is
/// how long after `begin` the window stays open. A window with `begin`
/// in the future is [`Window::future`]; one whose `begin + duration`
/// has already elapsed is [`Window::past`]; otherwise it is
/// [`Window::current`] (§8 boundary: "Window exactly equal to `now`:
/// treated as current, not past").
///
/// # Example
///
/// ```rust
/// use fleetrpc::envelope::Window;
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let window = Window::new(Utc::now(), Duration::from_secs(60));
/// assert!(window.current());
/// assert!(!window.past());
/// assert!(!window.future());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub begin: DateTime<Utc>,
    #[serde(with = "duration_seconds")]
    pub duration: StdDuration,
}

impl Window {
    pub fn new(begin: DateTime<Utc>, duration: StdDuration) -> Self {
        Self { begin, duration }
    }

    /// The window's end instant (`begin + duration`).
    pub fn end(&self) -> DateTime<Utc> {
        self.begin
            + chrono::Duration::from_std(self.duration).unwrap_or(chrono::Duration::zero())
    }

    /// `true` when the window has not opened yet (`now < begin`).
    pub fn future(&self) -> bool {
        Utc::now() < self.begin
    }

    /// `true` when the window has already closed (`now > end`).
    pub fn past(&self) -> bool {
        Utc::now() > self.end()
    }

    /// `true` when the window is open right now (neither future nor past).
    pub fn current(&self) -> bool {
        !self.future() && !self.past()
    }
}

mod duration_seconds {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    use crate::util::time::parse_duration;

    /// Wire `duration` is "seconds or H:M:S" (§6); accept either shape on
    /// the way in, always write plain seconds on the way out.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Form {
        Seconds(u64),
        Clock(String),
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        match Form::deserialize(d)? {
            Form::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Form::Clock(spec) => parse_duration(&spec).map_err(D::Error::custom),
        }
    }
}
