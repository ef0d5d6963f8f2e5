use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::debug;

use crate::action::ActionInvocation;
use crate::error::{AppError, AppResult, DispatchError};
use crate::queue::{QueuePlan, QueueState};
use crate::stats::ActionStats;

use super::protocol::{
    CreateQueueMessage, FaultCategory, FaultMessage, HelloMessage, InvokeMessage,
    QueueNameMessage, WireRequest, WireResponse, read_frame, send_frame,
};

/// Executor-side connection to one agent.
///
/// Every method is one request/response round trip; agent-reported faults
/// are re-raised on this side by category, so callers can tell "the action
/// under test failed" apart from "the harness failed".
pub struct AgentClient {
    addr: String,
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl AgentClient {
    /// Connects to an agent and completes the hello handshake.
    ///
    /// # Errors
    ///
    /// Returns a connection error for an unreachable address and
    /// [`DispatchError::HelloRejected`] when the agent refuses the
    /// handshake (for example on a bad auth token).
    pub async fn connect(
        addr: &str,
        executor_id: &str,
        auth_token: Option<&str>,
    ) -> AppResult<Self> {
        let stream = TcpStream::connect(addr).await.map_err(|err| {
            AppError::dispatch(DispatchError::Connection {
                addr: addr.to_owned(),
                source: err,
            })
        })?;
        let (read_half, write_half) = stream.into_split();
        let mut client = Self {
            addr: addr.to_owned(),
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        let hello = WireRequest::Hello(HelloMessage {
            executor_id: executor_id.to_owned(),
            auth_token: auth_token.map(str::to_owned),
        });
        send_frame(&mut client.writer, &hello).await?;
        match read_frame::<WireResponse>(&mut client.reader).await? {
            WireResponse::Ok => {
                debug!("Connected to agent {}", addr);
                Ok(client)
            }
            WireResponse::Fault(fault) => Err(AppError::dispatch(DispatchError::HelloRejected {
                message: fault.message,
            })),
            WireResponse::State(_) | WireResponse::Results(_) | WireResponse::Value(_) => {
                Err(AppError::dispatch(DispatchError::UnexpectedResponse {
                    context: "hello handshake",
                }))
            }
        }
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn call(&mut self, request: &WireRequest) -> AppResult<WireResponse> {
        send_frame(&mut self.writer, request).await?;
        match read_frame::<WireResponse>(&mut self.reader).await? {
            WireResponse::Fault(fault) => Err(raise_fault(fault)),
            response @ (WireResponse::Ok
            | WireResponse::State(_)
            | WireResponse::Results(_)
            | WireResponse::Value(_)) => Ok(response),
        }
    }

    async fn call_expecting_ok(
        &mut self,
        request: &WireRequest,
        context: &'static str,
    ) -> AppResult<()> {
        match self.call(request).await? {
            WireResponse::Ok => Ok(()),
            WireResponse::State(_)
            | WireResponse::Results(_)
            | WireResponse::Value(_)
            | WireResponse::Fault(_) => {
                Err(AppError::dispatch(DispatchError::UnexpectedResponse {
                    context,
                }))
            }
        }
    }

    /// Creates and starts the queue on this agent.
    ///
    /// # Errors
    ///
    /// Agent-reported faults (queue collision, malformed plan) and
    /// transport failures.
    pub async fn create_queue(&mut self, plan: &QueuePlan) -> AppResult<()> {
        let request = WireRequest::CreateQueue(Box::new(CreateQueueMessage { plan: plan.clone() }));
        self.call_expecting_ok(&request, "create queue").await
    }

    /// # Errors
    ///
    /// Agent-reported faults and transport failures.
    pub async fn stop_queue(&mut self, name: &str) -> AppResult<()> {
        let request = WireRequest::StopQueue(QueueNameMessage {
            name: name.to_owned(),
        });
        self.call_expecting_ok(&request, "stop queue").await
    }

    /// Blocks until the named queue finishes on this agent.
    ///
    /// # Errors
    ///
    /// Agent-reported faults (including a queue aborted by an
    /// infrastructure fault) and transport failures.
    pub async fn wait_queue(&mut self, name: &str) -> AppResult<()> {
        let request = WireRequest::WaitQueue(QueueNameMessage {
            name: name.to_owned(),
        });
        self.call_expecting_ok(&request, "wait queue").await
    }

    /// # Errors
    ///
    /// Agent-reported faults and transport failures.
    pub async fn queue_state(&mut self, name: &str) -> AppResult<QueueState> {
        let request = WireRequest::QueueState(QueueNameMessage {
            name: name.to_owned(),
        });
        match self.call(&request).await? {
            WireResponse::State(message) => Ok(message.state),
            WireResponse::Ok
            | WireResponse::Results(_)
            | WireResponse::Value(_)
            | WireResponse::Fault(_) => {
                Err(AppError::dispatch(DispatchError::UnexpectedResponse {
                    context: "queue state",
                }))
            }
        }
    }

    /// Pulls this agent's statistics snapshot for the named queue.
    ///
    /// # Errors
    ///
    /// Agent-reported faults and transport failures.
    pub async fn queue_results(&mut self, name: &str) -> AppResult<Vec<ActionStats>> {
        let request = WireRequest::QueueResults(QueueNameMessage {
            name: name.to_owned(),
        });
        match self.call(&request).await? {
            WireResponse::Results(message) => Ok(message.stats),
            WireResponse::Ok
            | WireResponse::State(_)
            | WireResponse::Value(_)
            | WireResponse::Fault(_) => {
                Err(AppError::dispatch(DispatchError::UnexpectedResponse {
                    context: "queue results",
                }))
            }
        }
    }

    /// # Errors
    ///
    /// Agent-reported faults and transport failures.
    pub async fn remove_queue(&mut self, name: &str) -> AppResult<()> {
        let request = WireRequest::RemoveQueue(QueueNameMessage {
            name: name.to_owned(),
        });
        self.call_expecting_ok(&request, "remove queue").await
    }

    /// Executes a single action on this agent, outside any queue.
    ///
    /// # Errors
    ///
    /// [`DispatchError::ActionFailed`] when the action itself failed,
    /// [`DispatchError::AgentFailure`] for harness faults, and transport
    /// failures.
    pub async fn invoke(&mut self, invocation: &ActionInvocation) -> AppResult<serde_json::Value> {
        let request = WireRequest::Invoke(Box::new(InvokeMessage {
            invocation: invocation.clone(),
        }));
        match self.call(&request).await? {
            WireResponse::Value(message) => Ok(message.value),
            WireResponse::Ok
            | WireResponse::State(_)
            | WireResponse::Results(_)
            | WireResponse::Fault(_) => {
                Err(AppError::dispatch(DispatchError::UnexpectedResponse {
                    context: "invoke",
                }))
            }
        }
    }
}

fn raise_fault(fault: FaultMessage) -> AppError {
    let FaultMessage {
        category,
        tag,
        message,
    } = fault;
    let error = match category {
        FaultCategory::Action => DispatchError::ActionFailed { tag, message },
        FaultCategory::Usage => DispatchError::AgentUsage { tag, message },
        FaultCategory::Infrastructure => DispatchError::AgentFailure { tag, message },
    };
    AppError::dispatch(error)
}
