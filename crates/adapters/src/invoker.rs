// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child LLM CLI invocation: spawn a provider subprocess with piped
//! stdout, drain it line-by-line, and extract text/compaction/token-usage
//! signals from the stream-JSON protocol. One call per daemon-runner turn;
//! the child always exits before the next invocation starts.

use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Substrings that mark a provider-issued context-compaction event, checked
/// case-insensitively against both the raw line and its rendered text.
pub const DEFAULT_COMPACTION_MARKERS: &[&str] = &[
    "compaction",
    "compacted",
    "context window",
    "summarized prior",
    "summarised prior",
    "auto-compact",
];

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("command not found: {0}")]
    NotFound(String),
    #[error("failed to launch {0}: {1}")]
    SpawnFailed(String, io::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct InvokeRequest {
    /// `command[0]` is the binary; the rest are its arguments.
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    /// Terminate the child if no stdout line arrives within this window.
    pub no_output_timeout: Duration,
    /// Raw, unfiltered stream-JSON lines are appended here as they arrive.
    pub stream_log_path: PathBuf,
    /// Soft cap on echoed characters; past this, output is drained but not echoed.
    pub max_console_stream_chars: usize,
    /// Compaction substrings, overridable from the docs-dir `compaction-markers` contract.
    pub compaction_markers: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InvokeOutcome {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub interrupted: bool,
    pub compaction_detected: bool,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub context_window: Option<i64>,
    pub session_id: Option<String>,
    pub displayed_chars: usize,
    pub hidden_chars: usize,
}

/// Recursively extracts `text|content|delta|output_text` string values from
/// a parsed stream-JSON payload, in document order.
fn extract_text_fragments(value: &Value, out: &mut Vec<String>) {
    const TEXT_KEYS: &[&str] = &["text", "content", "delta", "output_text"];
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if TEXT_KEYS.contains(&key.as_str()) {
                    if let Value::String(s) = v {
                        out.push(s.clone());
                        continue;
                    }
                }
                extract_text_fragments(v, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                extract_text_fragments(item, out);
            }
        }
        _ => {}
    }
}

fn contains_marker(text: &str, markers: &[String]) -> bool {
    let low = text.to_lowercase();
    markers.iter().any(|m| low.contains(m.as_str()))
}

/// Renders a raw stream-JSON line to its displayable text and whether it
/// carries a compaction marker, checking the raw line, the rendered text,
/// and the JSON payload as a whole.
fn render_line(raw: &str, markers: &[String]) -> (String, bool) {
    let mut compaction = contains_marker(raw, markers);
    let Ok(payload) = serde_json::from_str::<Value>(raw) else {
        return (format!("{raw}\n"), compaction);
    };

    let mut fragments = Vec::new();
    extract_text_fragments(&payload, &mut fragments);
    let mut rendered = fragments.join("");

    if rendered.is_empty() {
        if let Some(event_type) = payload.get("type").and_then(Value::as_str) {
            if event_type == "error" || event_type == "warning" {
                let message = payload.get("message").and_then(Value::as_str).unwrap_or_default();
                rendered = format!("[{event_type}] {message}\n");
            }
        }
    }

    if contains_marker(&rendered, markers) || contains_marker(&payload.to_string(), markers) {
        compaction = true;
    }
    (rendered, compaction)
}

/// Recursively finds the first object containing an `input_tokens` key.
fn find_usage_dict(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    let obj = value.as_object()?;
    if obj.contains_key("input_tokens") {
        return Some(obj);
    }
    obj.values().find_map(find_usage_dict)
}

#[derive(Debug, Clone, Default)]
struct UsageSample {
    input_tokens: i64,
    output_tokens: i64,
    context_window: Option<i64>,
    session_id: Option<String>,
}

fn as_i64(v: Option<&Value>) -> i64 {
    v.and_then(Value::as_i64).unwrap_or(0)
}

/// Extracts token usage from one raw stream-JSON line: prefers the
/// `result` event's per-model `modelUsage` (which also carries
/// `contextWindow`), falling back to the first `*_tokens` dict found.
fn extract_usage(raw: &str) -> UsageSample {
    if !raw.contains("tokens") {
        return UsageSample::default();
    }
    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        return UsageSample::default();
    };
    let Some(obj) = data.as_object() else {
        return UsageSample::default();
    };

    if obj.get("type").and_then(Value::as_str) == Some("result") {
        let session_id = obj
            .get("session_id")
            .or_else(|| obj.get("sessionId"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(model_usage) = obj.get("modelUsage").and_then(Value::as_object) {
            for model_info in model_usage.values() {
                let Some(model_info) = model_info.as_object() else { continue };
                let input = as_i64(model_info.get("inputTokens"))
                    + as_i64(model_info.get("cacheCreationInputTokens"))
                    + as_i64(model_info.get("cacheReadInputTokens"));
                let output = as_i64(model_info.get("outputTokens"));
                let context_window = model_info.get("contextWindow").and_then(Value::as_i64).filter(|w| *w > 0);
                return UsageSample {
                    input_tokens: input,
                    output_tokens: output,
                    context_window,
                    session_id,
                };
            }
        }
        return UsageSample {
            session_id,
            ..Default::default()
        };
    }

    let Some(usage) = find_usage_dict(&data) else {
        return UsageSample::default();
    };
    UsageSample {
        input_tokens: as_i64(usage.get("input_tokens"))
            + as_i64(usage.get("cache_creation_input_tokens"))
            + as_i64(usage.get("cache_read_input_tokens")),
        output_tokens: as_i64(usage.get("output_tokens")),
        context_window: None,
        session_id: None,
    }
}

/// Spawns and drains a single child invocation. Implementors back a
/// real subprocess or (in tests) a canned result.
#[async_trait]
pub trait ChildInvoker: Send + Sync + 'static {
    async fn invoke(
        &self,
        request: InvokeRequest,
        on_output: &(dyn Fn(&str) + Send + Sync),
        should_interrupt: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<InvokeOutcome, InvokeError>;
}

/// Real subprocess invoker: stdin closed, stdout piped, stderr merged.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl ChildInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        request: InvokeRequest,
        on_output: &(dyn Fn(&str) + Send + Sync),
        should_interrupt: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<InvokeOutcome, InvokeError> {
        let Some(binary) = request.command.first() else {
            return Err(InvokeError::NotFound(String::new()));
        };

        let mut cmd = Command::new(binary);
        cmd.args(&request.command[1..])
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for (k, v) in &request.env {
            cmd.env(k, v);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(InvokeError::NotFound(binary.clone()));
            }
            Err(e) => return Err(InvokeError::SpawnFailed(binary.clone(), e)),
        };

        // Just configured Stdio::piped() above, so this is always present.
        #[allow(clippy::expect_used)]
        let stdout = child.stdout.take().expect("piped stdout");
        let mut lines = BufReader::new(stdout).lines();

        let mut stream_log = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&request.stream_log_path)
            .await?;

        let mut outcome = InvokeOutcome::default();
        let mut last_output_at = Instant::now();
        let mut last_interrupt_check = Instant::now();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        None => break,
                        Some(raw) => {
                            last_output_at = Instant::now();
                            stream_log.write_all(raw.as_bytes()).await?;
                            stream_log.write_all(b"\n").await?;

                            let (rendered, has_compaction) = render_line(&raw, &request.compaction_markers);
                            let usage = extract_usage(&raw);
                            if usage.input_tokens > 0 {
                                outcome.input_tokens = usage.input_tokens;
                            }
                            if usage.output_tokens > 0 {
                                outcome.output_tokens = usage.output_tokens;
                            }
                            if usage.context_window.is_some() {
                                outcome.context_window = usage.context_window;
                            }
                            if usage.session_id.is_some() {
                                outcome.session_id = usage.session_id;
                            }
                            if has_compaction {
                                outcome.compaction_detected = true;
                            }
                            if !rendered.is_empty() {
                                let remaining = request.max_console_stream_chars.saturating_sub(outcome.displayed_chars);
                                if remaining > 0 {
                                    let chunk: String = rendered.chars().take(remaining).collect();
                                    on_output(&chunk);
                                    outcome.displayed_chars += chunk.chars().count();
                                    outcome.hidden_chars += rendered.chars().count() - chunk.chars().count();
                                } else {
                                    outcome.hidden_chars += rendered.chars().count();
                                }
                            }
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    if last_output_at.elapsed() > request.no_output_timeout {
                        outcome.timed_out = true;
                        let _ = child.start_kill();
                        break;
                    }
                    if last_interrupt_check.elapsed() > Duration::from_secs(2) {
                        last_interrupt_check = Instant::now();
                        if should_interrupt() {
                            outcome.interrupted = true;
                            let _ = child.start_kill();
                            break;
                        }
                    }
                }
            }
        }

        outcome.exit_code = child.wait().await.ok().and_then(|s| s.code());
        Ok(outcome)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Canned-result invoker for daemon-loop tests: never spawns a real
    /// process, returns queued outcomes in order.
    #[derive(Clone, Default)]
    pub struct FakeInvoker {
        queued: Arc<Mutex<Vec<InvokeOutcome>>>,
        pub calls: Arc<Mutex<Vec<InvokeRequest>>>,
    }

    impl FakeInvoker {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_outcome(&self, outcome: InvokeOutcome) {
            self.queued.lock().push(outcome);
        }
    }

    #[async_trait]
    impl ChildInvoker for FakeInvoker {
        async fn invoke(
            &self,
            request: InvokeRequest,
            _on_output: &(dyn Fn(&str) + Send + Sync),
            _should_interrupt: &(dyn Fn() -> bool + Send + Sync),
        ) -> Result<InvokeOutcome, InvokeError> {
            self.calls.lock().push(request);
            Ok(self.queued.lock().pop().unwrap_or_default())
        }
    }
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;
