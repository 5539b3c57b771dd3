//! On-disk record shapes for the pending store (§3 "PendingEntry").

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::envelope::Envelope;
use crate::util::Sn;

/// A parked envelope, indexed by `sn` and ordered by `window.begin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub envelope: Envelope,
    /// Monotonic insertion counter, used only to break ties when two
    /// entries share the same `window.begin` (§4.3 "Ordering").
    pub seq: u64,
}

impl PendingEntry {
    pub fn sn(&self) -> Sn {
        self.envelope.sn
    }
}

/// One line of the append-only log (§4.3 "Crash safety").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Record {
    Insert { entry: PendingEntry },
    Remove { sn: Sn },
}
