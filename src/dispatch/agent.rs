use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::action::{ActionFault, ActionInvoker, FaultKind};
use crate::config::AgentSettings;
use crate::error::{AppError, AppResult, DispatchError, QueueError, StatsError, ValidationError};
use crate::queue::QueueManager;

use super::protocol::{
    FaultCategory, FaultMessage, ResultsMessage, StateMessage, ValueMessage, WireRequest,
    WireResponse, read_frame, send_frame,
};

/// One agent process: its queue manager, its action invoker, and the auth
/// token connecting executors must present.
pub struct AgentServer {
    manager: Arc<QueueManager>,
    invoker: Arc<dyn ActionInvoker>,
    auth_token: Option<String>,
}

impl AgentServer {
    #[must_use]
    pub fn new(
        manager: Arc<QueueManager>,
        invoker: Arc<dyn ActionInvoker>,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            manager,
            invoker,
            auth_token,
        }
    }
}

/// Binds the configured listen address and serves executor connections until
/// the task is cancelled.
///
/// # Errors
///
/// Returns a bind error for an unusable listen address; accept errors end
/// the loop.
pub async fn run_agent(
    settings: &AgentSettings,
    invoker: Arc<dyn ActionInvoker>,
) -> AppResult<()> {
    let listener = TcpListener::bind(&settings.listen).await.map_err(|err| {
        AppError::dispatch(DispatchError::Bind {
            addr: settings.listen.clone(),
            source: err,
        })
    })?;
    let manager = Arc::new(QueueManager::new(Arc::new(
        crate::stats::QueueStatsRegistry::new(),
    )));
    let server = Arc::new(AgentServer::new(
        manager,
        invoker,
        settings.auth_token.clone(),
    ));
    serve(listener, server).await
}

/// Accept loop over an already bound listener; one task per executor
/// connection. Split from [`run_agent`] so tests can bind port 0 first.
///
/// # Errors
///
/// Returns the accept error that ended the loop.
pub async fn serve(listener: TcpListener, server: Arc<AgentServer>) -> AppResult<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Agent listening on {}", addr);
    }
    loop {
        let (stream, peer) = listener.accept().await.map_err(|err| {
            AppError::dispatch(DispatchError::Io {
                context: "accept executor connection",
                source: err,
            })
        })?;
        debug!("Executor connected from {}", peer);
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &server).await {
                debug!("Connection from {} ended: {}", peer, err);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, server: &AgentServer) -> AppResult<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Handshake: the first frame must be a hello carrying a valid token.
    match read_frame::<WireRequest>(&mut reader).await? {
        WireRequest::Hello(hello) => {
            if let Some(expected) = server.auth_token.as_deref() {
                let provided = hello.auth_token.as_deref().unwrap_or("");
                if provided != expected {
                    let fault = FaultMessage {
                        category: FaultCategory::Usage,
                        tag: "InvalidAuthToken".to_owned(),
                        message: "Invalid auth token.".to_owned(),
                    };
                    send_frame(&mut writer, &WireResponse::Fault(fault)).await?;
                    return Err(AppError::dispatch(DispatchError::InvalidAuthToken));
                }
            }
            info!("Executor '{}' connected", hello.executor_id);
            send_frame(&mut writer, &WireResponse::Ok).await?;
        }
        WireRequest::CreateQueue(_)
        | WireRequest::StopQueue(_)
        | WireRequest::WaitQueue(_)
        | WireRequest::QueueState(_)
        | WireRequest::QueueResults(_)
        | WireRequest::RemoveQueue(_)
        | WireRequest::Invoke(_) => {
            let fault = FaultMessage {
                category: FaultCategory::Usage,
                tag: "ExpectedHello".to_owned(),
                message: "The first frame must be a hello.".to_owned(),
            };
            send_frame(&mut writer, &WireResponse::Fault(fault)).await?;
            return Err(AppError::dispatch(DispatchError::ExpectedHello));
        }
    }

    loop {
        let request = match read_frame::<WireRequest>(&mut reader).await {
            Ok(request) => request,
            Err(AppError::Dispatch(DispatchError::ConnectionClosed)) => return Ok(()),
            Err(err) => return Err(err),
        };
        let response = handle_request(server, request).await;
        send_frame(&mut writer, &response).await?;
    }
}

async fn handle_request(server: &AgentServer, request: WireRequest) -> WireResponse {
    match request {
        WireRequest::Hello(_) => WireResponse::Fault(FaultMessage {
            category: FaultCategory::Usage,
            tag: "UnexpectedHello".to_owned(),
            message: "Handshake already completed.".to_owned(),
        }),
        WireRequest::CreateQueue(message) => {
            match server
                .manager
                .create(message.plan, Arc::clone(&server.invoker))
            {
                Ok(()) => WireResponse::Ok,
                Err(err) => WireResponse::Fault(app_fault(&err)),
            }
        }
        WireRequest::StopQueue(message) => match server.manager.stop(&message.name) {
            Ok(()) => WireResponse::Ok,
            Err(err) => WireResponse::Fault(queue_fault(&err)),
        },
        WireRequest::WaitQueue(message) => match server.manager.wait(&message.name).await {
            Ok(()) => WireResponse::Ok,
            Err(err) => WireResponse::Fault(queue_fault(&err)),
        },
        WireRequest::QueueState(message) => match server.manager.state(&message.name) {
            Ok(state) => WireResponse::State(StateMessage { state }),
            Err(err) => WireResponse::Fault(queue_fault(&err)),
        },
        WireRequest::QueueResults(message) => match server.manager.results(&message.name) {
            Ok(stats) => WireResponse::Results(ResultsMessage { stats }),
            Err(err) => WireResponse::Fault(stats_fault(&err)),
        },
        WireRequest::RemoveQueue(message) => match server.manager.remove(&message.name) {
            Ok(()) => WireResponse::Ok,
            Err(err) => WireResponse::Fault(queue_fault(&err)),
        },
        WireRequest::Invoke(message) => {
            if let Err(err) = message.invocation.validate() {
                return WireResponse::Fault(validation_fault(&err));
            }
            match server.invoker.invoke(&message.invocation).await {
                Ok(value) => WireResponse::Value(ValueMessage { value }),
                Err(fault) => WireResponse::Fault(action_fault(&fault)),
            }
        }
    }
}

fn queue_fault(error: &QueueError) -> FaultMessage {
    let (category, tag) = match error {
        QueueError::AlreadyExists { .. } => (FaultCategory::Usage, "LoadQueueAlreadyExists"),
        QueueError::NoSuchQueue { .. } => (FaultCategory::Usage, "NoSuchLoadQueue"),
        QueueError::StillRunning { .. } => (FaultCategory::Usage, "LoadQueueStillRunning"),
        QueueError::Aborted { .. } => (FaultCategory::Infrastructure, "LoadQueueAborted"),
    };
    FaultMessage {
        category,
        tag: tag.to_owned(),
        message: error.to_string(),
    }
}

fn stats_fault(error: &StatsError) -> FaultMessage {
    FaultMessage {
        category: FaultCategory::Usage,
        tag: "UnknownQueue".to_owned(),
        message: error.to_string(),
    }
}

fn validation_fault(error: &ValidationError) -> FaultMessage {
    FaultMessage {
        category: FaultCategory::Usage,
        tag: "Validation".to_owned(),
        message: error.to_string(),
    }
}

fn action_fault(fault: &ActionFault) -> FaultMessage {
    let category = match fault.kind {
        FaultKind::Action => FaultCategory::Action,
        FaultKind::Infrastructure => FaultCategory::Infrastructure,
    };
    FaultMessage {
        category,
        tag: fault.tag.clone(),
        message: fault.message.clone(),
    }
}

fn app_fault(error: &AppError) -> FaultMessage {
    match error {
        AppError::Validation(inner) => validation_fault(inner),
        AppError::Queue(inner) => queue_fault(inner),
        AppError::Stats(inner) => stats_fault(inner),
        AppError::Io { .. }
        | AppError::Clap { .. }
        | AppError::Json { .. }
        | AppError::Join { .. }
        | AppError::Config(_)
        | AppError::Dispatch(_) => FaultMessage {
            category: FaultCategory::Infrastructure,
            tag: "Internal".to_owned(),
            message: error.to_string(),
        },
    }
}
