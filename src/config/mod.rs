//! Configuration file loading for agents and executors.
//!
//! Settings come from a TOML or JSON file. An explicit `--config` path wins;
//! otherwise `loadgrid.toml` then `loadgrid.json` in the working directory
//! are tried. Command-line flags override whatever the file provides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};


pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8089";

/// Settings for one agent process.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    /// Socket address the agent listens on.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Token executors must present in the hello frame. `None` disables
    /// the check.
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN_ADDR.to_owned()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            auth_token: None,
        }
    }
}

pub const DEFAULT_WORKERS: usize = 1;
/// Threshold in whole percent; every action must fully pass by default.
pub const DEFAULT_PASS_RATE: u64 = 100;

/// Settings for an executor process driving a set of agents.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// Agent addresses, `host:port` each.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Identifier sent in the hello frame; defaults to the hostname-free
    /// `"executor"` when absent.
    #[serde(default)]
    pub executor_id: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Concurrent workers per agent for queue runs.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Minimum pass rate in whole percent (0 to 100) for a `Passed` verdict.
    #[serde(default = "default_pass_rate")]
    pub pass_rate: u64,
}

const fn default_workers() -> usize {
    DEFAULT_WORKERS
}

const fn default_pass_rate() -> u64 {
    DEFAULT_PASS_RATE
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            agents: Vec::new(),
            executor_id: None,
            auth_token: None,
            workers: DEFAULT_WORKERS,
            pass_rate: DEFAULT_PASS_RATE,
        }
    }
}

impl ExecutorSettings {
    /// The configured pass rate scaled to hundredths of a percent, the unit
    /// verdict math runs in.
    #[must_use]
    pub const fn pass_rate_x100(&self) -> u64 {
        self.pass_rate.saturating_mul(100)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub agent: Option<AgentSettings>,
    pub executor: Option<ExecutorSettings>,
}

/// Loads a configuration file from the provided path or default locations.
///
/// # Errors
///
/// Returns an error when the config file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        let path = PathBuf::from(path);
        return Ok(Some(load_config_file(&path)?));
    }

    let toml_path = PathBuf::from("loadgrid.toml");
    if toml_path.exists() {
        return Ok(Some(load_config_file(&toml_path)?));
    }

    let json_path = PathBuf::from("loadgrid.json");
    if json_path.exists() {
        return Ok(Some(load_config_file(&json_path)?));
    }

    Ok(None)
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
