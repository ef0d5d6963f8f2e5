use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::debug;

use crate::action::{ActionFault, ActionInvoker, FaultKind};
use crate::stats::QueueStatsRegistry;

use super::QueuePlan;

/// Runs one queue's share of work across its workers.
///
/// Each worker executes its allocated iterations; an iteration runs the
/// plan's actions in order and records one statistic per action. A domain
/// fault counts as a failed execution and the run continues; an
/// infrastructure fault aborts the whole queue.
pub(super) async fn run_queue(
    plan: Arc<QueuePlan>,
    shares: Vec<u64>,
    invoker: Arc<dyn ActionInvoker>,
    stats: Arc<QueueStatsRegistry>,
    cancel_rx: watch::Receiver<bool>,
) -> Result<(), ActionFault> {
    let mut handles = Vec::with_capacity(shares.len());
    for (worker_index, share) in shares.into_iter().enumerate() {
        let plan = Arc::clone(&plan);
        let invoker = Arc::clone(&invoker);
        let stats = Arc::clone(&stats);
        let cancel_rx = cancel_rx.clone();
        handles.push(tokio::spawn(async move {
            run_worker(&plan, share, invoker.as_ref(), &stats, &cancel_rx).await?;
            debug!(
                "Worker {} of queue '{}' finished its {} iterations",
                worker_index, plan.name, share
            );
            Ok::<(), ActionFault>(())
        }));
    }

    let mut first_fault: Option<ActionFault> = None;
    for join_result in join_all(handles).await {
        let worker_result = join_result.unwrap_or_else(|err| {
            Err(ActionFault::infrastructure(
                "WorkerPanic",
                format!("Queue worker task failed: {}", err),
            ))
        });
        if let Err(fault) = worker_result {
            if first_fault.is_none() {
                first_fault = Some(fault);
            }
        }
    }

    match first_fault {
        Some(fault) => Err(fault),
        None => Ok(()),
    }
}

async fn run_worker(
    plan: &QueuePlan,
    iterations: u64,
    invoker: &dyn ActionInvoker,
    stats: &QueueStatsRegistry,
    cancel_rx: &watch::Receiver<bool>,
) -> Result<(), ActionFault> {
    for _ in 0..iterations {
        // In-flight iterations complete after a stop; no new one starts.
        if *cancel_rx.borrow() {
            break;
        }
        for action in &plan.actions {
            let action_name = action.action_name();
            let passed = match invoker.invoke(action).await {
                Ok(_) => true,
                Err(fault) => match fault.kind {
                    FaultKind::Action => false,
                    FaultKind::Infrastructure => return Err(fault),
                },
            };
            stats
                .register_result(&plan.name, &action_name, passed)
                .map_err(|err| {
                    ActionFault::infrastructure("StatsRegistry", err.to_string())
                })?;
        }
    }
    Ok(())
}
