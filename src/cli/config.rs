use anyhow::{anyhow, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::core::CoercionPolicy;

/// Client configuration, read from a TOML file and then overridden by
/// command line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin serving `/api/list`, `/api/read` and `/api/submit`
    pub backend_url: String,
    /// Whole-request timeout in milliseconds, 0 disables it
    pub timeout_ms: u32,
    /// Conversion of edit text into register values
    pub coercion: CoercionPolicy,
    /// Log destination while the TUI owns the terminal
    pub log_file: Option<PathBuf>,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_ms() -> u32 {
    3000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
            coercion: CoercionPolicy::default(),
            log_file: None,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|err| anyhow!("Invalid configuration: {err}"))
    }

    /// Read configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("Failed to read config {path}: {err}"))?;
        Self::from_toml(&content)
    }

    /// Build the effective configuration: `--config` file (if any), then flags.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = matches.get_one::<String>("backend") {
            config.backend_url = url.clone();
        }
        if let Some(timeout) = matches.get_one::<u32>("timeout-ms") {
            config.timeout_ms = *timeout;
        }
        if matches.get_flag("strict") {
            config.coercion = CoercionPolicy::Strict;
        }
        if let Some(path) = matches.get_one::<String>("log-file") {
            config.log_file = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms as u64))
    }

    /// Log file used in TUI mode when none is configured.
    pub fn tui_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("regpanel.log"))
    }
}
