use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("No execution statistics for queue '{name}' - the queue was never initialized.")]
    UnknownQueue { name: String },
}
