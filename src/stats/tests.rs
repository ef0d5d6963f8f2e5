use std::sync::Arc;

use super::{ActionStats, QueueStatsRegistry};

#[test]
fn record_updates_one_counter() -> Result<(), String> {
    let mut stats = ActionStats::new("upload".to_owned());
    stats.record(true);
    stats.record(true);
    stats.record(false);
    if stats.passed != 2 || stats.failed != 1 {
        return Err(format!(
            "Unexpected counters: passed={} failed={}",
            stats.passed, stats.failed
        ));
    }
    if stats.executions() != 3 {
        return Err(format!("Unexpected executions: {}", stats.executions()));
    }
    Ok(())
}

#[test]
fn merge_is_associative_and_commutative() -> Result<(), String> {
    let part = |passed: u64, failed: u64| ActionStats {
        action_name: "upload".to_owned(),
        passed,
        failed,
    };

    // ((a + b) + c) grouped left.
    let mut left = part(1, 2);
    left.merge(&part(3, 4));
    left.merge(&part(5, 6));

    // (a + (c + b)) grouped right with swapped operands.
    let mut inner = part(5, 6);
    inner.merge(&part(3, 4));
    let mut right = part(1, 2);
    right.merge(&inner);

    if left != right {
        return Err(format!("Merge groupings differ: {:?} vs {:?}", left, right));
    }
    if left.passed != 9 || left.failed != 12 {
        return Err(format!(
            "Unexpected merged counters: passed={} failed={}",
            left.passed, left.failed
        ));
    }
    Ok(())
}

#[test]
fn merge_saturates_instead_of_wrapping() -> Result<(), String> {
    let mut stats = ActionStats {
        action_name: "upload".to_owned(),
        passed: u64::MAX,
        failed: 0,
    };
    stats.merge(&ActionStats {
        action_name: "upload".to_owned(),
        passed: 10,
        failed: 0,
    });
    if stats.passed != u64::MAX {
        return Err(format!("Expected saturation, got {}", stats.passed));
    }
    Ok(())
}

#[test]
fn init_then_results_is_empty() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    registry.init_queue("queue-1");
    let results = registry
        .results("queue-1")
        .map_err(|err| format!("Results failed: {}", err))?;
    if !results.is_empty() {
        return Err(format!("Expected empty results, got {}", results.len()));
    }
    Ok(())
}

#[test]
fn reinit_clears_previous_counters() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    registry.init_queue("queue-1");
    registry
        .register_result("queue-1", "upload", true)
        .map_err(|err| format!("Register failed: {}", err))?;
    registry.init_queue("queue-1");
    let results = registry
        .results("queue-1")
        .map_err(|err| format!("Results failed: {}", err))?;
    if !results.is_empty() {
        return Err(format!(
            "Expected cleared results after re-init, got {}",
            results.len()
        ));
    }
    Ok(())
}

#[test]
fn register_against_unknown_queue_fails() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    match registry.register_result("missing", "upload", true) {
        Err(err) => {
            let message = err.to_string();
            if !message.contains("missing") {
                return Err(format!("Error does not name the queue: {}", message));
            }
            Ok(())
        }
        Ok(()) => Err("Expected unknown queue error".to_owned()),
    }
}

#[test]
fn results_for_unknown_queue_fails() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    match registry.results("missing") {
        Err(err) => {
            if !err.to_string().contains("missing") {
                return Err(format!("Error does not name the queue: {}", err));
            }
            Ok(())
        }
        Ok(_) => Err("Expected unknown queue error".to_owned()),
    }
}

#[test]
fn results_are_ordered_by_action_name() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    registry.init_queue("queue-1");
    for action in ["zeta", "alpha", "mid"] {
        registry
            .register_result("queue-1", action, true)
            .map_err(|err| format!("Register failed: {}", err))?;
    }
    let names: Vec<String> = registry
        .results("queue-1")
        .map_err(|err| format!("Results failed: {}", err))?
        .into_iter()
        .map(|stats| stats.action_name)
        .collect();
    if names != vec!["alpha".to_owned(), "mid".to_owned(), "zeta".to_owned()] {
        return Err(format!("Unexpected order: {:?}", names));
    }
    Ok(())
}

#[test]
fn concurrent_registration_loses_no_updates() -> Result<(), String> {
    const THREADS: usize = 8;
    const PER_THREAD: u64 = 500;

    let registry = Arc::new(QueueStatsRegistry::new());
    registry.init_queue("queue-1");

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let registry = Arc::clone(&registry);
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    let _register_result = registry.register_result("queue-1", "upload", true);
                }
            });
        }
    });

    let results = registry
        .results("queue-1")
        .map_err(|err| format!("Results failed: {}", err))?;
    let total: u64 = results.iter().map(|stats| stats.passed).sum();
    let expected = u64::try_from(THREADS).unwrap_or(u64::MAX).saturating_mul(PER_THREAD);
    if total != expected {
        return Err(format!("Lost updates: expected {}, got {}", expected, total));
    }
    Ok(())
}

#[test]
fn remove_queue_reports_presence() -> Result<(), String> {
    let registry = QueueStatsRegistry::new();
    registry.init_queue("queue-1");
    if !registry.remove_queue("queue-1") {
        return Err("Expected removal of an existing queue".to_owned());
    }
    if registry.remove_queue("queue-1") {
        return Err("Expected second removal to be a no-op".to_owned());
    }
    Ok(())
}
