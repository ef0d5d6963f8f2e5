//! CLI parsing and process startup.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::action::BuiltinInvoker;
use crate::config::{AgentSettings, load_config};
use crate::dispatch::run_agent;
use crate::error::{AppError, AppResult, ConfigError};

#[derive(Debug, Parser)]
#[clap(
    name = "loadgrid",
    version,
    about = "Distributed load-test agent: runs load queues of remote actions on behalf of an executor and reports per-action pass/fail statistics."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a TOML or JSON config file
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve load queues and action invocations for remote executors
    Agent(AgentArgs),
}

#[derive(Debug, Args)]
struct AgentArgs {
    /// Socket address to listen on (overrides the config file)
    #[arg(long = "listen")]
    listen: Option<String>,

    /// Token executors must present when connecting
    #[arg(long = "auth-token", env = "LOADGRID_AUTH_TOKEN")]
    auth_token: Option<String>,
}

/// Parses the command line and runs the selected subcommand to completion.
///
/// # Errors
///
/// Returns configuration errors, a bind failure on the listen address, or
/// whatever ends the agent's accept loop.
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    crate::logger::init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Agent(args) => {
            let settings = agent_settings(cli.config.as_deref(), &args)?;
            info!("Starting agent on {}", settings.listen);
            runtime.block_on(run_agent(&settings, Arc::new(BuiltinInvoker)))
        }
    }
}

fn agent_settings(config_path: Option<&str>, args: &AgentArgs) -> AppResult<AgentSettings> {
    // A config file named explicitly must carry an agent section; a file
    // merely discovered in the working directory may be executor-only.
    let mut settings = match load_config(config_path)? {
        Some(config) => match config.agent {
            Some(agent) => agent,
            None if config_path.is_some() => {
                return Err(AppError::config(ConfigError::MissingAgentSection));
            }
            None => AgentSettings::default(),
        },
        None => AgentSettings::default(),
    };
    if let Some(listen) = &args.listen {
        settings.listen = listen.clone();
    }
    if let Some(token) = &args.auth_token {
        settings.auth_token = Some(token.clone());
    }
    Ok(settings)
}
