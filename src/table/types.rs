use serde::{Deserialize, Serialize};

/// Per-table behavior switches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableOptions {
    /// Stop a find at the first `Empty` slot of its probe sequence.
    ///
    /// Sound because slots are never deleted and insert takes the first
    /// free slot it meets: a key cannot sit past an `Empty` slot on its own
    /// sequence. Off by default, which walks the full cycle.
    #[serde(default)]
    pub stop_at_empty: bool,
}
