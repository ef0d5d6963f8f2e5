use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Load cannot be distributed over zero channels.")]
    ZeroChannels,
    #[error("Argument arrays differ in length ({types} types, {values} values).")]
    ArgumentCountMismatch { types: usize, values: usize },
    #[error("Component name must not be empty.")]
    EmptyComponentName,
    #[error("Action method name must not be empty.")]
    EmptyMethodName,
    #[error("Unsupported argument type '{name}'.")]
    UnsupportedArgumentType { name: String },
    #[error("Invalid value for argument type '{type_name}': {source}")]
    InvalidArgumentValue {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Queue plan must contain at least one action.")]
    NoActions,
    #[error("Queue name must not be empty.")]
    EmptyQueueName,
}
