//! Named load queues and their lifecycle.
//!
//! A load queue is created in `Running` state, executes its iteration share
//! across concurrent workers, and transitions to `Finished` exactly once -
//! either because all iterations ran or because it was stopped or aborted.
//! At most one queue per name may be active at a time; reusing a finished
//! name starts a fresh run with cleared statistics.
mod manager;
mod plan;
mod worker;

pub use manager::QueueManager;
pub use plan::QueuePlan;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a named load queue. A name with no entry at all is
/// simply "not created".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Running,
    Finished,
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueState::Running => formatter.write_str("RUNNING"),
            QueueState::Finished => formatter.write_str("FINISHED"),
        }
    }
}

#[cfg(test)]
mod tests;
