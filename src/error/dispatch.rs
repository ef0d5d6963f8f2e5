use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection error to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Bind error on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection closed.")]
    ConnectionClosed,
    #[error("Wire frame exceeded max size ({max_bytes} bytes).")]
    FrameTooLarge { max_bytes: usize },
    #[error("Wire frame was not valid UTF-8: {source}")]
    FrameInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Deserialization error during {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Agent rejected handshake: {message}")]
    HelloRejected { message: String },
    #[error("Invalid auth token.")]
    InvalidAuthToken,
    #[error("Expected hello from executor.")]
    ExpectedHello,
    #[error("Unexpected response during {context}.")]
    UnexpectedResponse { context: &'static str },
    #[error("No agents configured for the run.")]
    NoAgents,
    #[error("Action failed on agent: {tag}: {message}")]
    ActionFailed { tag: String, message: String },
    #[error("Agent rejected request: {tag}: {message}")]
    AgentUsage { tag: String, message: String },
    #[error("Agent execution failed: {tag}: {message}")]
    AgentFailure { tag: String, message: String },
}
