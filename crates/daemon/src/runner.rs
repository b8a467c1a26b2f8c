// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent supervised loop : the outer generation loop
//! (register PID, run a generation, respawn on phoenix-down) and, within a
//! generation, the boot invocation followed by the poll-invoke loop that
//! drives the child LLM CLI.

use crate::config::RunnerConfig;
use crate::prompts;
use minion_adapters::{ChildInvoker, InvokeOutcome, InvokeRequest};
use minion_core::AgentClass;
use minion_engine::error::{EngineError, EngineResult};
use minion_engine::{comms, hp, poll};
use minion_store::Store;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Tunable constants governing the standdown/backoff schedule.
const MAX_BACKOFF_SECS: u64 = 300;
const TIMEOUTS_BEFORE_ALERT: u32 = 3;

/// Per-generation mutable state, reset whenever the outer loop respawns
/// on each respawn.
#[derive(Debug, Default)]
struct GenerationState {
    cumulative_input: i64,
    cumulative_output: i64,
    tool_overhead: i64,
    context_window: i64,
    resume_session_id: Option<String>,
    inject_history_next_turn: bool,
    stood_down: bool,
    last_task_id: Option<i64>,
    consecutive_timeouts: u32,
}

/// Outcome of running one generation: whether the outer loop should respawn.
enum GenerationExit {
    PhoenixDown,
    Stopped,
}

/// Outer generation loop : register SIGTERM/SIGINT via `stop`,
/// write PID + crew, increment `generation`, run a generation, and respawn
/// on `phoenix_down` until `stop` is set.
pub async fn run(
    cfg: &RunnerConfig,
    store: &Store,
    invoker: &dyn ChildInvoker,
    stop: &AtomicBool,
) -> EngineResult<()> {
    let mut generation = store.get_agent(&cfg.agent)?.map(|a| a.generation).unwrap_or(0);

    while !stop.load(Ordering::SeqCst) {
        generation += 1;
        store.set_agent_process(&cfg.agent, Some(std::process::id() as i64), generation)?;
        info!(agent = %cfg.agent, generation, "starting generation");

        match run_generation(cfg, store, invoker, stop, generation).await? {
            GenerationExit::PhoenixDown => {
                info!(agent = %cfg.agent, generation, "phoenix down, respawning fresh generation");
                continue;
            }
            GenerationExit::Stopped => break,
        }
    }
    Ok(())
}

async fn run_generation(
    cfg: &RunnerConfig,
    store: &Store,
    invoker: &dyn ChildInvoker,
    stop: &AtomicBool,
    generation: i64,
) -> EngineResult<GenerationExit> {
    let agent_row = store
        .get_agent(&cfg.agent)?
        .ok_or_else(|| EngineError::blocked(format!("{} is not registered", cfg.agent)))?;
    let class = AgentClass::from_str(&agent_row.class).map_err(|e| EngineError::invalid(e.to_string()))?;

    let mut state = GenerationState::default();

    // 1. Boot invocation.
    let boot_prompt = prompts::boot_prompt(&cfg.docs_dir, &cfg.provider_bin, class);
    let boot_outcome = logged_invoke(cfg, store, invoker, generation, &boot_prompt, None).await?;
    let estimated_tool_overhead = boot_outcome.input_tokens - (boot_prompt.chars().count() as i64 / 4);
    state.tool_overhead = estimated_tool_overhead.max(0);
    state.cumulative_input += boot_outcome.input_tokens;
    state.cumulative_output += boot_outcome.output_tokens;
    state.resume_session_id = boot_outcome.session_id.clone();
    apply_hp_update(cfg, store, &state, &boot_outcome)?;

    // 2. Poll-invoke loop.
    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(GenerationExit::Stopped);
        }

        let poll_result = poll::poll(store, &cfg.work_dir, &cfg.agent, cfg.poll_interval_s, cfg.poll_timeout_s)?;
        match poll_result.exit_code {
            poll::ExitCode::Terminate => {
                stop.store(true, Ordering::SeqCst);
                info!(agent = %cfg.agent, signal = ?poll_result.signal, "terminate signal received");
                return Ok(GenerationExit::Stopped);
            }
            poll::ExitCode::Timeout => {
                // This produces the visible "." heartbeat cadence during idle polling.
                continue;
            }
            poll::ExitCode::Content => {
                if state.stood_down {
                    wake_from_standdown(&mut state, &poll_result);
                }
                store.set_agent_status(&cfg.agent, "working")?;

                let inject_history = state
                    .inject_history_next_turn
                    .then(|| comms::history(store, &cfg.work_dir, &cfg.agent, 10))
                    .transpose()?;
                let turn_prompt = prompts::inbox_prompt(
                    &cfg.docs_dir,
                    &cfg.provider_bin,
                    class,
                    &poll_result,
                    inject_history.as_deref(),
                );
                state.inject_history_next_turn = false;

                let resume = state.resume_session_id.clone();
                let outcome = logged_invoke(cfg, store, invoker, generation, &turn_prompt, resume.as_deref()).await?;

                if let Some(exit) = handle_result(cfg, store, &mut state, &outcome, &poll_result, generation)? {
                    return Ok(exit);
                }

                if poll::has_claimable_work(store, &cfg.agent)? {
                    store.set_agent_status(&cfg.agent, "idle")?;
                } else {
                    standdown(cfg, store, &mut state)?;
                }
            }
        }
    }
}

/// Wraps [`invoke_child`] with an `invocation_log` row: the daemon runner owns
/// this telemetry for its own agent.
async fn logged_invoke(
    cfg: &RunnerConfig,
    store: &Store,
    invoker: &dyn ChildInvoker,
    generation: i64,
    prompt: &str,
    resume_session_id: Option<&str>,
) -> EngineResult<InvokeOutcome> {
    let log_id = store.begin_invocation(&cfg.agent, Some(std::process::id() as i64), cfg.model.as_deref(), generation)?;
    let outcome = invoke_child(cfg, store, invoker, generation, prompt, resume_session_id).await?;
    store.end_invocation(
        log_id,
        None,
        Some(outcome.input_tokens),
        Some(outcome.output_tokens),
        outcome.exit_code.map(i64::from),
        outcome.compaction_detected,
        outcome.timed_out,
        outcome.interrupted,
    )?;
    Ok(outcome)
}

/// Child invocation ("Child invocation"): build the
/// provider-specific command line and drain the child through the adapter.
async fn invoke_child(
    cfg: &RunnerConfig,
    store: &Store,
    invoker: &dyn ChildInvoker,
    generation: i64,
    prompt: &str,
    resume_session_id: Option<&str>,
) -> EngineResult<InvokeOutcome> {
    let mut command = vec![
        cfg.provider_bin.clone(),
        "-p".to_string(),
        prompt.to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
    ];
    if let Some(sid) = resume_session_id {
        command.push("--resume".to_string());
        command.push(sid.to_string());
    } else {
        command.push("--continue".to_string());
    }
    if let Some(model) = &cfg.model {
        command.push("--model".to_string());
        command.push(model.clone());
    }

    let request = InvokeRequest {
        command,
        cwd: cfg.work_dir.clone(),
        env: vec![
            (minion_core::ENV_DB_PATH.to_string(), cfg.db_path.display().to_string()),
            (minion_core::ENV_DOCS_DIR.to_string(), cfg.docs_dir.display().to_string()),
            (minion_core::ENV_CLASS.to_string(), cfg.agent.clone()),
        ],
        no_output_timeout: cfg.no_output_timeout,
        stream_log_path: cfg.stream_log_path(generation),
        max_console_stream_chars: cfg.max_console_stream_chars,
        compaction_markers: minion_adapters::DEFAULT_COMPACTION_MARKERS
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let on_output = |chunk: &str| print!("{chunk}");
    // Polled every ~2s by the invoker between output lines; consumed once so
    // a stale flag doesn't leak into the next invocation.
    let should_interrupt = || match store.has_interrupt(&cfg.agent) {
        Ok(true) => {
            let _ = store.clear_interrupt(&cfg.agent);
            true
        }
        Ok(false) => false,
        Err(e) => {
            warn!(agent = %cfg.agent, error = %e, "interrupt check failed, continuing");
            false
        }
    };
    invoker
        .invoke(request, &on_output, &should_interrupt)
        .await
        .map_err(|e| EngineError::Other(e.to_string()))
}

fn apply_hp_update(cfg: &RunnerConfig, store: &Store, state: &GenerationState, outcome: &InvokeOutcome) -> EngineResult<()> {
    if outcome.input_tokens <= 0 {
        return Ok(());
    }
    let limit = outcome.context_window.unwrap_or(state.context_window).max(1);
    hp::update_hp(
        store,
        &cfg.work_dir,
        &cfg.agent,
        state.cumulative_input,
        state.cumulative_output,
        limit,
        outcome.input_tokens,
        outcome.output_tokens,
    )?;
    Ok(())
}

/// Result handling ("Result handling"). Returns `Some(exit)`
/// when the generation should end (phoenix-down or a fatal poll terminate).
fn handle_result(
    cfg: &RunnerConfig,
    store: &Store,
    state: &mut GenerationState,
    outcome: &InvokeOutcome,
    poll_result: &poll::PollResult,
    generation: i64,
) -> EngineResult<Option<GenerationExit>> {
    state.cumulative_input += outcome.input_tokens;
    state.cumulative_output += outcome.output_tokens;
    if let Some(sid) = &outcome.session_id {
        state.resume_session_id = Some(sid.clone());
    }
    if let Some(cw) = outcome.context_window {
        state.context_window = cw;
    }
    if let Some(task) = poll_result.tasks.first() {
        state.last_task_id = Some(task.id);
    }

    if outcome.interrupted {
        return Ok(None);
    }

    if outcome.timed_out {
        state.consecutive_timeouts += 1;
        let backoff = backoff_secs(state.consecutive_timeouts);
        warn!(agent = %cfg.agent, consecutive = state.consecutive_timeouts, backoff, "child invocation timed out");
        if state.consecutive_timeouts >= TIMEOUTS_BEFORE_ALERT {
            notify_lead(store, &cfg.work_dir, &cfg.agent, &format!(
                "{} has timed out {} times in a row; last backoff {backoff}s",
                cfg.agent, state.consecutive_timeouts
            ))?;
        }
        std::thread::sleep(Duration::from_secs(backoff));
        return Ok(None);
    }
    state.consecutive_timeouts = 0;

    if outcome.compaction_detected {
        state.inject_history_next_turn = true;
        store.record_compaction(
            &cfg.agent,
            cfg.model.as_deref(),
            Some(std::process::id() as i64),
            None,
            Some(state.cumulative_input - outcome.input_tokens),
            Some(state.cumulative_input),
            generation,
        )?;
    }

    if outcome.input_tokens > 0 {
        apply_hp_update(cfg, store, state, outcome)?;
        let context_window = outcome.context_window.unwrap_or(state.context_window).max(1);
        let turn_pct = 100.0 * (1.0 - (outcome.input_tokens - state.tool_overhead) as f64 / context_window as f64);
        if turn_pct <= hp::PHOENIX_DOWN_PCT as f64 {
            notify_lead(store, &cfg.work_dir, &cfg.agent, &format!(
                "{} has dropped to {:.0}% HP and is phoenix-downing", cfg.agent, turn_pct
            ))?;
            store.set_agent_status(&cfg.agent, "phoenix_down")?;
            return Ok(Some(GenerationExit::PhoenixDown));
        }
    }

    Ok(None)
}

fn backoff_secs(consecutive_failures: u32) -> u64 {
    let secs = 2u64.saturating_pow(consecutive_failures.min(16));
    secs.min(MAX_BACKOFF_SECS)
}

/// Standdown ("Standdown/wake"): no claimable work after an
/// invocation — mark stood-down and alert lead once.
fn standdown(cfg: &RunnerConfig, store: &Store, state: &mut GenerationState) -> EngineResult<()> {
    if !state.stood_down {
        state.stood_down = true;
        notify_lead(store, &cfg.work_dir, &cfg.agent, &format!("{} has stood down (no claimable work)", cfg.agent))?;
    }
    store.set_agent_status(&cfg.agent, "stood_down")?;
    Ok(())
}

/// Wake from standdown: same task id or a message resumes the session;
/// a different task clears it so the next invocation starts fresh.
fn wake_from_standdown(state: &mut GenerationState, poll_result: &poll::PollResult) {
    state.stood_down = false;
    let has_message = poll_result
        .messages
        .as_ref()
        .map(|m| !m.direct.is_empty() || !m.broadcasts.is_empty())
        .unwrap_or(false);
    let same_task = poll_result
        .tasks
        .first()
        .map(|t| Some(t.id) == state.last_task_id)
        .unwrap_or(false);
    if !has_message && !same_task {
        state.resume_session_id = None;
    }
}

/// Daemon-internal alert to lead, bypassing `comms::send`'s hard gating
/// (unread-inbox/staleness/battle-plan preconditions don't apply to
/// system-originated operational alerts) — same pattern as
/// [`minion_engine::hp::update_hp`]'s threshold notifications.
fn notify_lead(store: &Store, work_dir: &std::path::Path, agent: &str, body: &str) -> EngineResult<()> {
    let lead = store
        .list_agents()?
        .into_iter()
        .find(|a| AgentClass::from_str(&a.class).ok() == Some(AgentClass::Lead));
    let Some(lead) = lead else { return Ok(()) };
    let now = minion_core::now_iso();
    let rel_path = format!("inbox/{}/{}-runner-alert-{agent}.md", lead.name, now.replace([':', '.'], "-"));
    minion_core::atomic_write(&work_dir.join(&rel_path), body)?;
    store.insert_message(minion_store::NewMessage {
        from_agent: "daemon-runtime",
        to_agent: &lead.name,
        content_file: &rel_path,
        is_cc: false,
        cc_original_to: None,
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
