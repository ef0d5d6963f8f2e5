use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::action::{ActionFault, ActionInvocation, ActionInvoker};
use crate::error::{AppError, QueueError};
use crate::stats::QueueStatsRegistry;

use super::{QueueManager, QueuePlan, QueueState};

/// Test double executing no real work: `ok` passes, `fail` is a domain
/// fault, `boom` is an infrastructure fault, `slow` passes after a delay.
struct ScriptedInvoker;

#[async_trait]
impl ActionInvoker for ScriptedInvoker {
    async fn invoke(&self, invocation: &ActionInvocation) -> Result<serde_json::Value, ActionFault> {
        match invocation.method_name.as_str() {
            "ok" => Ok(serde_json::Value::Null),
            "fail" => Err(ActionFault::action("ExpectedFailure", "scripted".to_owned())),
            "boom" => Err(ActionFault::infrastructure(
                "Broken",
                "scripted harness fault".to_owned(),
            )),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(serde_json::Value::Null)
            }
            other => Err(ActionFault::infrastructure(
                "UnknownAction",
                format!("no scripted action '{}'", other),
            )),
        }
    }
}

fn action(method: &str) -> ActionInvocation {
    ActionInvocation {
        action_id: 1,
        component_name: "scripted".to_owned(),
        method_name: method.to_owned(),
        argument_types: vec![],
        argument_values: vec![],
    }
}

fn plan(name: &str, methods: &[&str], iterations: u64, workers: usize) -> QueuePlan {
    QueuePlan {
        name: name.to_owned(),
        actions: methods.iter().map(|method| action(method)).collect(),
        iterations,
        workers,
    }
}

fn manager() -> QueueManager {
    QueueManager::new(Arc::new(QueueStatsRegistry::new()))
}

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

#[test]
fn queue_runs_all_iterations() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["ok"], 25, 4), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;

        let state = manager
            .state("q1")
            .map_err(|err| format!("State failed: {}", err))?;
        if state != QueueState::Finished {
            return Err(format!("Expected FINISHED, got {}", state));
        }

        let results = manager
            .results("q1")
            .map_err(|err| format!("Results failed: {}", err))?;
        let passed: u64 = results.iter().map(|stats| stats.passed).sum();
        if passed != 25 {
            return Err(format!("Expected 25 passed iterations, got {}", passed));
        }
        Ok(())
    })
}

#[test]
fn domain_faults_count_as_failed_and_run_continues() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["ok", "fail"], 10, 2), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;

        let results = manager
            .results("q1")
            .map_err(|err| format!("Results failed: {}", err))?;
        let ok_stats = results
            .iter()
            .find(|stats| stats.action_name == "scripted.ok")
            .ok_or("Missing scripted.ok stats")?;
        let fail_stats = results
            .iter()
            .find(|stats| stats.action_name == "scripted.fail")
            .ok_or("Missing scripted.fail stats")?;
        if ok_stats.passed != 10 || ok_stats.failed != 0 {
            return Err(format!("Unexpected ok stats: {:?}", ok_stats));
        }
        if fail_stats.passed != 0 || fail_stats.failed != 10 {
            return Err(format!("Unexpected fail stats: {:?}", fail_stats));
        }
        Ok(())
    })
}

#[test]
fn infrastructure_fault_aborts_the_queue() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["ok", "boom"], 100, 2), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        match manager.wait("q1").await {
            Err(QueueError::Aborted { tag, .. }) => {
                if tag != "Broken" {
                    return Err(format!("Unexpected abort tag: {}", tag));
                }
            }
            Err(err) => return Err(format!("Expected abort, got {}", err)),
            Ok(()) => return Err("Expected the queue to abort".to_owned()),
        }
        let state = manager
            .state("q1")
            .map_err(|err| format!("State failed: {}", err))?;
        if state != QueueState::Finished {
            return Err(format!("Aborted queue should be FINISHED, got {}", state));
        }

        // Counters only cover iterations that actually ran before the abort.
        let results = manager
            .results("q1")
            .map_err(|err| format!("Results failed: {}", err))?;
        let executions: u64 = results.iter().map(crate::stats::ActionStats::executions).sum();
        if executions >= 100 {
            return Err(format!(
                "Aborted queue recorded all planned iterations: {}",
                executions
            ));
        }
        if results
            .iter()
            .any(|stats| stats.action_name == "scripted.boom" && stats.passed > 0)
        {
            return Err("Faulting action recorded passed executions".to_owned());
        }
        Ok(())
    })
}

#[test]
fn duplicate_running_queue_is_rejected_with_state() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["slow"], 1_000, 2), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;

        match manager.create(plan("q1", &["ok"], 1, 1), Arc::new(ScriptedInvoker)) {
            Err(AppError::Queue(QueueError::AlreadyExists { name, state })) => {
                if name != "q1" || state != QueueState::Running {
                    return Err(format!("Unexpected collision details: {} {}", name, state));
                }
            }
            Err(err) => return Err(format!("Expected queue collision, got {}", err)),
            Ok(()) => return Err("Expected duplicate create to fail".to_owned()),
        }

        manager
            .stop("q1")
            .map_err(|err| format!("Stop failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;
        Ok(())
    })
}

#[test]
fn finished_name_can_be_reused_with_fresh_statistics() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["fail"], 5, 1), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;

        manager
            .create(plan("q1", &["ok"], 3, 1), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Re-create failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Second wait failed: {}", err))?;

        let results = manager
            .results("q1")
            .map_err(|err| format!("Results failed: {}", err))?;
        if results.iter().any(|stats| stats.action_name == "scripted.fail") {
            return Err("Statistics from the first run survived re-create".to_owned());
        }
        let passed: u64 = results.iter().map(|stats| stats.passed).sum();
        if passed != 3 {
            return Err(format!("Expected 3 passed iterations, got {}", passed));
        }
        Ok(())
    })
}

#[test]
fn stop_prevents_new_iterations() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["slow"], 10_000, 2), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager
            .stop("q1")
            .map_err(|err| format!("Stop failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;

        let results = manager
            .results("q1")
            .map_err(|err| format!("Results failed: {}", err))?;
        let executions: u64 = results.iter().map(crate::stats::ActionStats::executions).sum();
        if executions == 0 {
            return Err("Expected at least one executed iteration".to_owned());
        }
        if executions >= 10_000 {
            return Err(format!("Stop did not bound execution: {}", executions));
        }
        Ok(())
    })
}

#[test]
fn unknown_queue_operations_fail_cleanly() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        if !matches!(manager.stop("ghost"), Err(QueueError::NoSuchQueue { .. })) {
            return Err("Expected stop on unknown queue to fail".to_owned());
        }
        if !matches!(manager.state("ghost"), Err(QueueError::NoSuchQueue { .. })) {
            return Err("Expected state on unknown queue to fail".to_owned());
        }
        if !matches!(manager.wait("ghost").await, Err(QueueError::NoSuchQueue { .. })) {
            return Err("Expected wait on unknown queue to fail".to_owned());
        }
        if manager.results("ghost").is_ok() {
            return Err("Expected results on unknown queue to fail".to_owned());
        }
        Ok(())
    })
}

#[test]
fn remove_requires_a_finished_queue() -> Result<(), String> {
    run_async_test(async {
        let manager = manager();
        manager
            .create(plan("q1", &["slow"], 1_000, 1), Arc::new(ScriptedInvoker))
            .map_err(|err| format!("Create failed: {}", err))?;
        if !matches!(manager.remove("q1"), Err(QueueError::StillRunning { .. })) {
            return Err("Expected remove of a running queue to fail".to_owned());
        }

        manager
            .stop("q1")
            .map_err(|err| format!("Stop failed: {}", err))?;
        manager
            .wait("q1")
            .await
            .map_err(|err| format!("Wait failed: {}", err))?;
        manager
            .remove("q1")
            .map_err(|err| format!("Remove failed: {}", err))?;

        if !matches!(manager.state("q1"), Err(QueueError::NoSuchQueue { .. })) {
            return Err("Expected the removed queue to be gone".to_owned());
        }
        if manager.results("q1").is_ok() {
            return Err("Expected removed queue statistics to be gone".to_owned());
        }
        Ok(())
    })
}
