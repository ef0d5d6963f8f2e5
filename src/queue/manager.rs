use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::action::{ActionFault, ActionInvoker};
use crate::dispatch::allocation::even_load;
use crate::error::{AppError, AppResult, QueueError, StatsError};
use crate::stats::{ActionStats, QueueStatsRegistry};

use super::{QueuePlan, QueueState};

#[derive(Debug, Clone)]
enum QueueOutcome {
    Pending,
    Completed,
    Aborted(ActionFault),
}

struct QueueEntry {
    state: QueueState,
    cancel_tx: watch::Sender<bool>,
    outcome_rx: watch::Receiver<QueueOutcome>,
}

type QueueMap = Arc<Mutex<HashMap<String, QueueEntry>>>;

/// Owns every load queue on one agent process.
///
/// Explicitly constructed around the process statistics registry and shared
/// via `Arc`; the queue map itself is behind one lock, mutated only on
/// create/finish/remove transitions.
pub struct QueueManager {
    stats: Arc<QueueStatsRegistry>,
    queues: QueueMap,
}

impl QueueManager {
    #[must_use]
    pub fn new(stats: Arc<QueueStatsRegistry>) -> Self {
        Self {
            stats,
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(queues: &QueueMap) -> MutexGuard<'_, HashMap<String, QueueEntry>> {
        match queues.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Creates a queue and starts executing its plan.
    ///
    /// A `Finished` entry under the same name is discarded and its
    /// statistics cleared; a `Running` one is a collision.
    ///
    /// Must be called from within a tokio runtime - workers are spawned as
    /// tasks.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AlreadyExists`] on a name collision with a
    /// running queue, or a validation error when the plan is malformed.
    pub fn create(&self, plan: QueuePlan, invoker: Arc<dyn ActionInvoker>) -> AppResult<()> {
        plan.validate().map_err(AppError::validation)?;
        let shares = even_load(plan.iterations, plan.workers).map_err(AppError::validation)?;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (outcome_tx, outcome_rx) = watch::channel(QueueOutcome::Pending);

        {
            let mut queues = Self::lock(&self.queues);
            if let Some(entry) = queues.get(&plan.name) {
                if entry.state == QueueState::Running {
                    return Err(AppError::queue(QueueError::AlreadyExists {
                        name: plan.name.clone(),
                        state: entry.state,
                    }));
                }
                queues.remove(&plan.name);
            }
            self.stats.init_queue(&plan.name);
            queues.insert(
                plan.name.clone(),
                QueueEntry {
                    state: QueueState::Running,
                    cancel_tx,
                    outcome_rx,
                },
            );
        }

        info!(
            "Starting queue '{}' ({} iterations over {} workers)",
            plan.name, plan.iterations, plan.workers
        );

        let queue_name = plan.name.clone();
        let plan = Arc::new(plan);
        let stats = Arc::clone(&self.stats);
        let queues = Arc::clone(&self.queues);
        tokio::spawn(async move {
            let run_result =
                super::worker::run_queue(plan, shares, invoker, stats, cancel_rx).await;
            let outcome = match run_result {
                Ok(()) => QueueOutcome::Completed,
                Err(fault) => {
                    warn!("Queue '{}' aborted: {}", queue_name, fault);
                    QueueOutcome::Aborted(fault)
                }
            };
            {
                let mut queues = Self::lock(&queues);
                if let Some(entry) = queues.get_mut(&queue_name) {
                    entry.state = QueueState::Finished;
                }
            }
            info!("Queue '{}' finished", queue_name);
            let _send_result = outcome_tx.send(outcome);
        });

        Ok(())
    }

    /// Signals a running queue to stop. In-flight invocations complete; no
    /// new iteration starts afterward. Stopping a finished queue is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoSuchQueue`] when the name was never created.
    pub fn stop(&self, queue_name: &str) -> Result<(), QueueError> {
        let queues = Self::lock(&self.queues);
        let entry = queues.get(queue_name).ok_or_else(|| QueueError::NoSuchQueue {
            name: queue_name.to_owned(),
        })?;
        let _send_result = entry.cancel_tx.send(true);
        Ok(())
    }

    /// Waits until the queue reaches `Finished`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoSuchQueue`] for an unknown name, or
    /// [`QueueError::Aborted`] when the run ended with an infrastructure
    /// fault.
    pub async fn wait(&self, queue_name: &str) -> Result<(), QueueError> {
        let mut outcome_rx = {
            let queues = Self::lock(&self.queues);
            let entry = queues.get(queue_name).ok_or_else(|| QueueError::NoSuchQueue {
                name: queue_name.to_owned(),
            })?;
            entry.outcome_rx.clone()
        };

        loop {
            let outcome = outcome_rx.borrow().clone();
            match outcome {
                QueueOutcome::Completed => return Ok(()),
                QueueOutcome::Aborted(fault) => {
                    return Err(QueueError::Aborted {
                        name: queue_name.to_owned(),
                        tag: fault.tag,
                        message: fault.message,
                    });
                }
                QueueOutcome::Pending => {
                    if outcome_rx.changed().await.is_err() {
                        // Sender dropped without a final outcome; re-read the
                        // last value on the next loop turn before giving up.
                        let last = outcome_rx.borrow().clone();
                        if let QueueOutcome::Pending = last {
                            return Err(QueueError::Aborted {
                                name: queue_name.to_owned(),
                                tag: "QueueRunner".to_owned(),
                                message: "Queue runner ended without an outcome".to_owned(),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Non-blocking state read.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoSuchQueue`] for an unknown name.
    pub fn state(&self, queue_name: &str) -> Result<QueueState, QueueError> {
        let queues = Self::lock(&self.queues);
        queues
            .get(queue_name)
            .map(|entry| entry.state)
            .ok_or_else(|| QueueError::NoSuchQueue {
                name: queue_name.to_owned(),
            })
    }

    /// Snapshot of the queue's statistics. Valid at any time; a read taken
    /// while the queue still runs is a point-in-time copy.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::UnknownQueue`] when the queue was never
    /// initialized.
    pub fn results(&self, queue_name: &str) -> Result<Vec<ActionStats>, StatsError> {
        self.stats.results(queue_name)
    }

    /// Drops a finished queue and its statistics.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoSuchQueue`] for an unknown name and
    /// [`QueueError::StillRunning`] when the queue has not finished.
    pub fn remove(&self, queue_name: &str) -> Result<(), QueueError> {
        let mut queues = Self::lock(&self.queues);
        let entry = queues.get(queue_name).ok_or_else(|| QueueError::NoSuchQueue {
            name: queue_name.to_owned(),
        })?;
        if entry.state == QueueState::Running {
            return Err(QueueError::StillRunning {
                name: queue_name.to_owned(),
            });
        }
        queues.remove(queue_name);
        self.stats.remove_queue(queue_name);
        Ok(())
    }

    /// The statistics registry this manager records into.
    #[must_use]
    pub fn stats(&self) -> &Arc<QueueStatsRegistry> {
        &self.stats
    }
}
