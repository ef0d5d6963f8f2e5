//! Action invocations and the seam through which they execute.
//!
//! An [`ActionInvocation`] is the transportable description of one action
//! call: which component, which method, and positionally correlated argument
//! type names and JSON-encoded values. Agents execute invocations through an
//! [`ActionInvoker`] implementation; the harness itself never knows what an
//! action does, only whether it passed, failed, or broke the harness.
mod builtin;
mod value;

pub use builtin::BuiltinInvoker;
pub use value::{ArgValue, decode_argument};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// One action call as it crosses the wire.
///
/// Invariant: `argument_types` and `argument_values` have equal length and
/// `argument_types[i]` names the decoder for `argument_values[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub action_id: i64,
    pub component_name: String,
    pub method_name: String,
    pub argument_types: Vec<String>,
    pub argument_values: Vec<String>,
}

impl ActionInvocation {
    /// Checks the structural invariants of the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a name is empty or the argument
    /// arrays differ in length.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.component_name.is_empty() {
            return Err(ValidationError::EmptyComponentName);
        }
        if self.method_name.is_empty() {
            return Err(ValidationError::EmptyMethodName);
        }
        if self.argument_types.len() != self.argument_values.len() {
            return Err(ValidationError::ArgumentCountMismatch {
                types: self.argument_types.len(),
                values: self.argument_values.len(),
            });
        }
        Ok(())
    }

    /// The name under which this action is counted in queue statistics.
    #[must_use]
    pub fn action_name(&self) -> String {
        format!("{}.{}", self.component_name, self.method_name)
    }

    /// Decodes the argument values according to their declared type names.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the payload is malformed, a type
    /// name is unsupported, or a value does not parse as its declared type.
    pub fn decode_arguments(&self) -> Result<Vec<ArgValue>, ValidationError> {
        self.validate()?;
        self.argument_types
            .iter()
            .zip(self.argument_values.iter())
            .map(|(type_name, raw)| decode_argument(type_name, raw))
            .collect()
    }
}

/// Whether a fault is the action's own outcome or a harness defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The invoked action itself failed - an expected, test-relevant result.
    Action,
    /// The harness failed: unknown component, decode error, broken
    /// collaborator. Fatal to the queue run.
    Infrastructure,
}

/// A failure carried back from an action execution, with enough context
/// (original error tag plus message) to be re-raised on the executor side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{tag}: {message}")]
pub struct ActionFault {
    pub kind: FaultKind,
    pub tag: String,
    pub message: String,
}

impl ActionFault {
    #[must_use]
    pub fn action(tag: &str, message: String) -> Self {
        Self {
            kind: FaultKind::Action,
            tag: tag.to_owned(),
            message,
        }
    }

    #[must_use]
    pub fn infrastructure(tag: &str, message: String) -> Self {
        Self {
            kind: FaultKind::Infrastructure,
            tag: tag.to_owned(),
            message,
        }
    }
}

/// Executes action invocations on behalf of the agent.
///
/// Implementations wrap whatever actually performs the work - a component
/// registry, a scripted stub, an in-process test double. The queue runner and
/// the wire layer only see this trait.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(&self, invocation: &ActionInvocation) -> Result<serde_json::Value, ActionFault>;
}
