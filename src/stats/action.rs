use serde::{Deserialize, Serialize};

/// Pass/fail counters for one action within one load queue.
///
/// An instance is mutated by exactly one owner (the registry, under its
/// lock) while a queue runs. Counters are 64-bit and all additions saturate,
/// so very long soak runs degrade to a pinned counter instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub action_name: String,
    pub passed: u64,
    pub failed: u64,
}

impl ActionStats {
    #[must_use]
    pub const fn new(action_name: String) -> Self {
        Self {
            action_name,
            passed: 0,
            failed: 0,
        }
    }

    /// Records the outcome of one execution of this action.
    pub fn record(&mut self, passed: bool) {
        if passed {
            self.passed = self.passed.saturating_add(1);
        } else {
            self.failed = self.failed.saturating_add(1);
        }
    }

    /// Folds another agent's counters for the same action into this one.
    ///
    /// Field-wise saturating addition, so merging is associative and
    /// commutative in effect regardless of how partial results are grouped.
    pub fn merge(&mut self, other: &ActionStats) {
        self.passed = self.passed.saturating_add(other.passed);
        self.failed = self.failed.saturating_add(other.failed);
    }

    #[must_use]
    pub const fn executions(&self) -> u64 {
        self.passed.saturating_add(self.failed)
    }
}
