// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent daemon configuration, resolved from the environment the party
//! spawn wired up ("wire each daemon process to the same DB
//! path via environment").

use minion_core::paths::{resolve_db_path, resolve_docs_dir};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_AGENT: &str = "MINION_AGENT";
pub const ENV_PROVIDER_BIN: &str = "MINION_PROVIDER_BIN";
pub const ENV_MODEL: &str = "MINION_MODEL";
pub const ENV_LOG_DIR: &str = "MINION_LOG_DIR";
pub const ENV_NO_OUTPUT_TIMEOUT_SECS: &str = "MINION_NO_OUTPUT_TIMEOUT_SECS";
pub const ENV_MAX_CONSOLE_STREAM_CHARS: &str = "MINION_MAX_CONSOLE_STREAM_CHARS";

const DEFAULT_PROVIDER_BIN: &str = "claude";
const DEFAULT_POLL_INTERVAL_S: u64 = 5;
const DEFAULT_POLL_TIMEOUT_S: u64 = 30;
const DEFAULT_NO_OUTPUT_TIMEOUT_SECS: u64 = 180;
const DEFAULT_MAX_CONSOLE_STREAM_CHARS: usize = 12_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} is required (the agent this daemon process supervises)", ENV_AGENT)]
    MissingAgent,
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub agent: String,
    pub db_path: PathBuf,
    pub work_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub log_dir: PathBuf,
    pub provider_bin: String,
    pub model: Option<String>,
    pub poll_interval_s: u64,
    pub poll_timeout_s: u64,
    pub no_output_timeout: Duration,
    pub max_console_stream_chars: usize,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let agent = std::env::var(ENV_AGENT).map_err(|_| ConfigError::MissingAgent)?;
        let db_path = resolve_db_path();
        let work_dir = db_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let docs_dir = resolve_docs_dir();
        let log_dir = std::env::var(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("logs"));
        let provider_bin = std::env::var(ENV_PROVIDER_BIN).unwrap_or_else(|_| DEFAULT_PROVIDER_BIN.to_string());
        let model = std::env::var(ENV_MODEL).ok().filter(|s| !s.is_empty());
        let no_output_timeout = std::env::var(ENV_NO_OUTPUT_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_NO_OUTPUT_TIMEOUT_SECS));
        let max_console_stream_chars = std::env::var(ENV_MAX_CONSOLE_STREAM_CHARS)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_CONSOLE_STREAM_CHARS);

        Ok(Self {
            agent,
            db_path,
            work_dir,
            docs_dir,
            log_dir,
            provider_bin,
            model,
            poll_interval_s: DEFAULT_POLL_INTERVAL_S,
            poll_timeout_s: DEFAULT_POLL_TIMEOUT_S,
            no_output_timeout,
            max_console_stream_chars,
        })
    }

    pub fn stream_log_path(&self, generation: i64) -> PathBuf {
        self.log_dir.join(format!("{}.gen{generation}.stream.jsonl", self.agent))
    }
}
