//! Remote dispatch: even load allocation, the agent wire protocol, and the
//! executor-side driver that schedules queues on agents and merges their
//! statistics.
pub mod allocation;
mod agent;
mod client;
mod executor;
mod protocol;

pub use agent::{AgentServer, run_agent, serve};
pub use client::AgentClient;
pub use executor::{
    Executor, PASS_RATE_SCALE, QueueReport, QueueVerdict, RunPlan, queue_verdict,
};
pub use protocol::{FaultCategory, FaultMessage, WireRequest, WireResponse};
