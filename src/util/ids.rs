// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::str::FromStr;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Request serial number (`sn`).
///
/// Every envelope belonging to one logical call — the request, its
/// `started` marker, any `progress` updates, and the terminal reply —
/// carries the same `Sn` (§3 invariant: "`sn` is stable across all
/// envelopes of one call"). Generated with UUID v4 and serialized as a
/// plain string on the wire (§6: "`sn` (uuid-v4 string)").
///
/// # Example
///
/// ```rust
/// use fleetrpc::util::Sn;
///
/// let a = Sn::new();
/// let b = Sn::new();
/// assert_ne!(a, b);
/// assert_eq!(a.to_string().parse::<Sn>().unwrap(), a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sn(Uuid);

impl Sn {
    /// Generate a fresh, random serial number.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID as a serial number.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for Sn {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Sn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Sn {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An agent's durable identity (its queue and binding-key uuid, §3).
///
/// Two agents sharing the same `AgentId` resolve to the same
/// [`crate::envelope::Destination`] — the spec calls this out as
/// intentional (broadcast-by-re-addressing, §3 "Destination").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Generate a fresh, random agent id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID as an agent id.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sn_is_unique() {
        assert_ne!(Sn::new(), Sn::new());
    }

    #[test]
    fn sn_round_trips_through_display_and_fromstr() {
        let sn = Sn::new();
        let text = sn.to_string();
        assert_eq!(text.parse::<Sn>().unwrap(), sn);
    }

    #[test]
    fn sn_round_trips_through_json() {
        let sn = Sn::new();
        let json = serde_json::to_string(&sn).unwrap();
        let back: Sn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sn);
    }

    #[test]
    fn agent_id_is_unique() {
        assert_ne!(AgentId::new(), AgentId::new());
    }
}
