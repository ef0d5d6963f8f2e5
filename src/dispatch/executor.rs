use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::action::ActionInvocation;
use crate::config::ExecutorSettings;
use crate::error::{AppError, AppResult, DispatchError};
use crate::queue::QueuePlan;
use crate::stats::ActionStats;

use super::allocation::even_load;
use super::client::AgentClient;

/// Scale for pass rates in hundredths of a percent (100.00% = 10_000).
pub const PASS_RATE_SCALE: u64 = 10_000;

/// One distributed queue run as requested by a test driver: the action list,
/// the total iteration count to spread over all agents, the worker count on
/// each agent, and the pass-rate threshold deciding the verdict.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub queue_name: String,
    pub actions: Vec<ActionInvocation>,
    pub total_iterations: u64,
    pub workers_per_agent: usize,
    /// Minimum pass rate in hundredths of a percent (10_000 = 100.00%).
    pub pass_rate_x100: u64,
}

impl RunPlan {
    /// Builds a plan for one run, taking the worker count and pass-rate
    /// threshold from the executor configuration.
    #[must_use]
    pub fn from_settings(
        queue_name: String,
        actions: Vec<ActionInvocation>,
        total_iterations: u64,
        settings: &ExecutorSettings,
    ) -> Self {
        Self {
            queue_name,
            actions,
            total_iterations,
            workers_per_agent: settings.workers,
            pass_rate_x100: settings.pass_rate_x100(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueVerdict {
    Passed,
    Failed,
}

/// Cross-agent result of one queue run: statistics merged per action name,
/// plus the verdict derived from them.
#[derive(Debug, Clone)]
pub struct QueueReport {
    pub queue_name: String,
    pub stats: Vec<ActionStats>,
    pub verdict: QueueVerdict,
}

/// Executor-side driver for a set of agents.
pub struct Executor {
    executor_id: String,
    agents: Vec<String>,
    auth_token: Option<String>,
}

impl Executor {
    #[must_use]
    pub fn new(executor_id: String, agents: Vec<String>, auth_token: Option<String>) -> Self {
        Self {
            executor_id,
            agents,
            auth_token,
        }
    }

    /// Builds an executor from a loaded `[executor]` config section.
    #[must_use]
    pub fn from_settings(settings: &ExecutorSettings) -> Self {
        let executor_id = settings
            .executor_id
            .clone()
            .unwrap_or_else(|| "executor".to_owned());
        Self::new(
            executor_id,
            settings.agents.clone(),
            settings.auth_token.clone(),
        )
    }

    #[must_use]
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Runs one load queue across all configured agents.
    ///
    /// The total iteration count is split evenly over the agents; each agent
    /// runs its share, then all per-agent statistics are pulled, merged per
    /// action name, and reduced to a verdict. Queues are removed from the
    /// agents once their results are collected.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoAgents`] for an empty agent list, and any
    /// per-agent usage, action, or transport fault. A harness-level fault on
    /// any agent aborts the whole run.
    pub async fn run_queue(&self, plan: &RunPlan) -> AppResult<QueueReport> {
        if self.agents.is_empty() {
            return Err(AppError::dispatch(DispatchError::NoAgents));
        }
        let shares =
            even_load(plan.total_iterations, self.agents.len()).map_err(AppError::validation)?;

        // Schedule the queue on every agent first, so the agents start their
        // shares close together, then wait on all of them concurrently.
        let mut clients = Vec::with_capacity(self.agents.len());
        for (agent, share) in self.agents.iter().zip(shares.iter()) {
            match self.schedule_on(agent, plan, *share).await {
                Ok(client) => clients.push(client),
                Err(err) => {
                    // Agents scheduled before the failure are already running
                    // a queue nobody will wait for; stop them before bailing.
                    for client in &mut clients {
                        let _stop_result = client.stop_queue(&plan.queue_name).await;
                    }
                    return Err(err);
                }
            }
        }

        let queue_name = plan.queue_name.clone();
        let collections = clients.into_iter().map(|mut client| {
            let queue_name = queue_name.clone();
            async move {
                client.wait_queue(&queue_name).await?;
                let stats = client.queue_results(&queue_name).await?;
                client.remove_queue(&queue_name).await?;
                Ok::<Vec<ActionStats>, AppError>(stats)
            }
        });

        let mut merged: BTreeMap<String, ActionStats> = BTreeMap::new();
        for collected in join_all(collections).await {
            for stats in collected? {
                match merged.get_mut(&stats.action_name) {
                    Some(existing) => existing.merge(&stats),
                    None => {
                        merged.insert(stats.action_name.clone(), stats);
                    }
                }
            }
        }

        let stats: Vec<ActionStats> = merged.into_values().collect();
        let verdict = queue_verdict(&stats, plan.pass_rate_x100);
        info!(
            "Queue '{}' finished across {} agents: {:?}",
            plan.queue_name,
            self.agents.len(),
            verdict
        );
        Ok(QueueReport {
            queue_name: plan.queue_name.clone(),
            stats,
            verdict,
        })
    }

    async fn schedule_on(&self, agent: &str, plan: &RunPlan, share: u64) -> AppResult<AgentClient> {
        let mut client =
            AgentClient::connect(agent, &self.executor_id, self.auth_token.as_deref()).await?;
        let agent_plan = QueuePlan {
            name: plan.queue_name.clone(),
            actions: plan.actions.clone(),
            iterations: share,
            workers: plan.workers_per_agent,
        };
        client.create_queue(&agent_plan).await?;
        debug!(
            "Scheduled queue '{}' on {} ({} iterations)",
            plan.queue_name,
            client.addr(),
            share
        );
        Ok(client)
    }

    /// Signals every agent to stop the named queue. Best effort: agents that
    /// no longer know the queue are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first transport failure; usage faults are ignored.
    pub async fn stop_queue(&self, queue_name: &str) -> AppResult<()> {
        for agent in &self.agents {
            let mut client =
                AgentClient::connect(agent, &self.executor_id, self.auth_token.as_deref()).await?;
            match client.stop_queue(queue_name).await {
                Ok(()) => {}
                Err(AppError::Dispatch(DispatchError::AgentUsage { .. })) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Executes one action on one specific agent, outside any queue.
    ///
    /// # Errors
    ///
    /// Action, usage, and transport faults, each as its own
    /// [`DispatchError`] variant.
    pub async fn invoke_on(
        &self,
        agent: &str,
        invocation: &ActionInvocation,
    ) -> AppResult<serde_json::Value> {
        let mut client =
            AgentClient::connect(agent, &self.executor_id, self.auth_token.as_deref()).await?;
        client.invoke(invocation).await
    }
}

/// Derives the run verdict from merged statistics the way the pass-rate rule
/// defines it: the least-passed action over the most-executed action must
/// reach the threshold. An empty result set fails - nothing ran.
#[must_use]
pub fn queue_verdict(stats: &[ActionStats], pass_rate_x100: u64) -> QueueVerdict {
    let mut max_executions = 0u64;
    let mut min_passed = u64::MAX;
    for entry in stats {
        if entry.executions() > max_executions {
            max_executions = entry.executions();
        }
        if entry.passed < min_passed {
            min_passed = entry.passed;
        }
    }
    if max_executions == 0 {
        return QueueVerdict::Failed;
    }

    let scaled = u128::from(min_passed)
        .saturating_mul(u128::from(PASS_RATE_SCALE))
        .checked_div(u128::from(max_executions))
        .unwrap_or(0);
    if u64::try_from(scaled).unwrap_or(u64::MAX) >= pass_rate_x100 {
        QueueVerdict::Passed
    } else {
        QueueVerdict::Failed
    }
}
