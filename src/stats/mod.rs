//! Per-queue action execution statistics.
//!
//! Every agent process holds one [`QueueStatsRegistry`]; executing workers
//! register pass/fail results through it per completed action. The executor
//! side pulls each agent's snapshot after a run and folds them together with
//! [`ActionStats::merge`].
mod action;
mod registry;

pub use action::ActionStats;
pub use registry::QueueStatsRegistry;

#[cfg(test)]
mod tests;
