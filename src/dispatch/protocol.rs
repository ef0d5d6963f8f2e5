use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::action::ActionInvocation;
use crate::error::{AppError, AppResult, DispatchError};
use crate::queue::{QueuePlan, QueueState};
use crate::stats::ActionStats;

/// Requests an executor sends to an agent, one JSON object per line.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireRequest {
    Hello(HelloMessage),
    CreateQueue(Box<CreateQueueMessage>),
    StopQueue(QueueNameMessage),
    WaitQueue(QueueNameMessage),
    QueueState(QueueNameMessage),
    QueueResults(QueueNameMessage),
    RemoveQueue(QueueNameMessage),
    Invoke(Box<InvokeMessage>),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloMessage {
    pub executor_id: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQueueMessage {
    pub plan: QueuePlan,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueNameMessage {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeMessage {
    pub invocation: ActionInvocation,
}

/// Agent replies, positionally paired with requests.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireResponse {
    Ok,
    State(StateMessage),
    Results(ResultsMessage),
    Value(ValueMessage),
    Fault(FaultMessage),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateMessage {
    pub state: QueueState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResultsMessage {
    pub stats: Vec<ActionStats>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValueMessage {
    pub value: serde_json::Value,
}

/// Error carried over the wire with its original tag and message, so the
/// executor side can re-raise it in the right category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultMessage {
    pub category: FaultCategory,
    pub tag: String,
    pub message: String,
}

/// Who is at fault. `Usage` is a caller mistake, `Action` is the action's
/// own failure, `Infrastructure` is harness breakage on the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultCategory {
    Usage,
    Action,
    Infrastructure,
}

pub(super) const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

pub(super) async fn read_frame<TFrame>(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
) -> AppResult<TFrame>
where
    TFrame: DeserializeOwned,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let bytes = reader.read_until(b'\n', &mut buffer).await.map_err(|err| {
        AppError::dispatch(DispatchError::Io {
            context: "read wire frame",
            source: err,
        })
    })?;
    if bytes == 0 {
        return Err(AppError::dispatch(DispatchError::ConnectionClosed));
    }
    if buffer.len() > MAX_FRAME_BYTES {
        return Err(AppError::dispatch(DispatchError::FrameTooLarge {
            max_bytes: MAX_FRAME_BYTES,
        }));
    }
    if buffer.ends_with(b"\n") {
        buffer.pop();
        if buffer.ends_with(b"\r") {
            buffer.pop();
        }
    }
    let line = std::str::from_utf8(&buffer)
        .map_err(|err| AppError::dispatch(DispatchError::FrameInvalidUtf8 { source: err }))?;
    serde_json::from_str::<TFrame>(line).map_err(|err| {
        AppError::dispatch(DispatchError::Deserialize {
            context: "wire frame",
            source: err,
        })
    })
}

pub(super) async fn send_frame<TFrame>(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    frame: &TFrame,
) -> AppResult<()>
where
    TFrame: Serialize,
{
    let mut payload = serde_json::to_string(frame).map_err(|err| {
        AppError::dispatch(DispatchError::Serialize {
            context: "wire frame",
            source: err,
        })
    })?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await.map_err(|err| {
        AppError::dispatch(DispatchError::Io {
            context: "send wire frame",
            source: err,
        })
    })
}
