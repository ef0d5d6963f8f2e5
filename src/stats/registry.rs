use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::error::StatsError;

use super::ActionStats;

type QueueMap = HashMap<String, BTreeMap<String, ActionStats>>;

/// Process-wide registry mapping queue name to per-action statistics.
///
/// One instance per agent process, explicitly constructed by its owner and
/// shared via `Arc` with every worker; there is no global singleton. A single
/// coarse lock guards the whole map, which is adequate at the expected
/// contention level (one short critical section per completed action).
#[derive(Debug, Default)]
pub struct QueueStatsRegistry {
    queues: Mutex<QueueMap>,
}

impl QueueStatsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueMap> {
        // A poisoned lock only means another worker panicked mid-update;
        // the counters themselves are always internally consistent.
        match self.queues.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Prepares the registry for a run of the named queue.
    ///
    /// Creates an empty entry, or clears the previous counters when the name
    /// is being reused. Must be called before any [`register_result`] for
    /// that queue.
    ///
    /// [`register_result`]: QueueStatsRegistry::register_result
    pub fn init_queue(&self, queue_name: &str) {
        let mut queues = self.lock();
        match queues.get_mut(queue_name) {
            Some(actions) => actions.clear(),
            None => {
                queues.insert(queue_name.to_owned(), BTreeMap::new());
            }
        }
    }

    /// Registers one action execution result for a running queue.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::UnknownQueue`] when the queue was never
    /// initialized; results are never recorded against auto-created queues.
    pub fn register_result(
        &self,
        queue_name: &str,
        action_name: &str,
        passed: bool,
    ) -> Result<(), StatsError> {
        let mut queues = self.lock();
        let actions = queues
            .get_mut(queue_name)
            .ok_or_else(|| StatsError::UnknownQueue {
                name: queue_name.to_owned(),
            })?;
        actions
            .entry(action_name.to_owned())
            .or_insert_with(|| ActionStats::new(action_name.to_owned()))
            .record(passed);
        Ok(())
    }

    /// Returns a snapshot of all action statistics for a queue, ordered by
    /// action name. Mutations after the call do not affect the returned list.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::UnknownQueue`] when the queue was never
    /// initialized.
    pub fn results(&self, queue_name: &str) -> Result<Vec<ActionStats>, StatsError> {
        let queues = self.lock();
        let actions = queues
            .get(queue_name)
            .ok_or_else(|| StatsError::UnknownQueue {
                name: queue_name.to_owned(),
            })?;
        Ok(actions.values().cloned().collect())
    }

    /// Drops a queue's statistics, returning whether an entry existed.
    ///
    /// Entries are not evicted on read; owners call this once results have
    /// been collected to bound memory growth across many runs.
    pub fn remove_queue(&self, queue_name: &str) -> bool {
        self.lock().remove(queue_name).is_some()
    }
}
