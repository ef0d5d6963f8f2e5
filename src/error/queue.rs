use thiserror::Error;

use crate::queue::QueueState;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Load queue '{name}' already exists in {state} state.")]
    AlreadyExists { name: String, state: QueueState },
    #[error("No such load queue '{name}'.")]
    NoSuchQueue { name: String },
    #[error("Load queue '{name}' is still running.")]
    StillRunning { name: String },
    #[error("Load queue '{name}' aborted: {tag}: {message}")]
    Aborted {
        name: String,
        tag: String,
        message: String,
    },
}
