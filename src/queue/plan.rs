use serde::{Deserialize, Serialize};

use crate::action::ActionInvocation;
use crate::error::ValidationError;

/// Everything an agent needs to run one load queue: the actions each
/// iteration performs, how many iterations in total, and how many concurrent
/// workers share them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePlan {
    pub name: String,
    pub actions: Vec<ActionInvocation>,
    pub iterations: u64,
    pub workers: usize,
}

impl QueuePlan {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the plan cannot be executed: empty
    /// queue name, no actions, zero workers, or a malformed action payload.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyQueueName);
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions);
        }
        if self.workers == 0 {
            return Err(ValidationError::ZeroChannels);
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }
}
