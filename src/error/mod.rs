mod app;
mod config;
mod dispatch;
mod queue;
mod stats;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use queue::QueueError;
pub use stats::StatsError;
pub use validation::ValidationError;
