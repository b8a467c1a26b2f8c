// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The blocking `poll` rendezvous between daemon and database: signal
//! phase, message peek, four-tier task search, then either a content
//! record or a timeout/terminate code.

use crate::comms::{self, CheckInboxOutcome};
use crate::error::{EngineError, EngineResult};
use minion_core::{AgentClass, Capability};
use minion_store::{Store, Task};
use std::path::Path;
use std::str::FromStr;
use std::thread::sleep;
use std::time::{Duration, Instant};

const REVIEW_HANDOFF_STATUSES: &[&str] = &["fixed", "verified"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ExitCode {
    Content = 0,
    Timeout = 1,
    Terminate = 3,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PollResult {
    pub exit_code: ExitCode,
    pub signal: Option<String>,
    pub messages: Option<CheckInboxOutcome>,
    pub tasks: Vec<Task>,
    pub transport_hint: Option<String>,
}

impl PollResult {
    fn terminate(signal: &str) -> Self {
        PollResult {
            exit_code: ExitCode::Terminate,
            signal: Some(signal.to_string()),
            messages: None,
            tasks: Vec::new(),
            transport_hint: None,
        }
    }

    fn timeout() -> Self {
        PollResult {
            exit_code: ExitCode::Timeout,
            signal: None,
            messages: None,
            tasks: Vec::new(),
            transport_hint: None,
        }
    }
}

/// `poll(agent, interval_s, timeout_s)` — blocks in-process using
/// `interval_s` sleeps; `timeout_s == 0` blocks indefinitely (the daemon
/// runner supplies a finite timeout for its invoke loop).
pub fn poll(
    store: &Store,
    work_dir: &Path,
    agent: &str,
    interval_s: u64,
    timeout_s: u64,
) -> EngineResult<PollResult> {
    let start = Instant::now();
    loop {
        if let Some(signal) = check_signals(store, agent)? {
            return Ok(PollResult::terminate(&signal));
        }

        let unread = store.unread_direct_count(agent)? + store.unread_broadcast_count(agent)?;
        let tasks = if store.flag_is_set(minion_store::FLAG_MOON_CRASH)? {
            Vec::new()
        } else {
            find_claimable_tasks(store, agent)?
        };

        if unread > 0 || !tasks.is_empty() {
            let messages = comms::check_inbox(store, work_dir, agent)?;
            let agent_row = store
                .get_agent(agent)?
                .ok_or_else(|| EngineError::blocked(format!("{agent} is not registered")))?;
            let transport_hint = (agent_row.transport == "terminal")
                .then(|| "restart polling as a background task".to_string());
            return Ok(PollResult {
                exit_code: ExitCode::Content,
                signal: None,
                messages: Some(messages),
                tasks,
                transport_hint,
            });
        }

        if timeout_s > 0 && start.elapsed() >= Duration::from_secs(timeout_s) {
            return Ok(PollResult::timeout());
        }

        sleep(Duration::from_secs(interval_s.max(1)));
    }
}

/// Cheap, non-blocking work-check used by the daemon runner's standdown
/// decision : true if the agent has unread messages or any
/// claimable task, without sleeping or consuming the inbox.
pub fn has_claimable_work(store: &Store, agent: &str) -> EngineResult<bool> {
    let unread = store.unread_direct_count(agent)? + store.unread_broadcast_count(agent)?;
    if unread > 0 {
        return Ok(true);
    }
    if store.flag_is_set(minion_store::FLAG_MOON_CRASH)? {
        return Ok(false);
    }
    Ok(!find_claimable_tasks(store, agent)?.is_empty())
}

fn check_signals(store: &Store, agent: &str) -> EngineResult<Option<String>> {
    if store.flag_is_set(minion_store::FLAG_STAND_DOWN)? {
        return Ok(Some(minion_store::FLAG_STAND_DOWN.to_string()));
    }
    if store.has_retire_marker(agent)? {
        return Ok(Some("retire".to_string()));
    }
    Ok(None)
}

fn find_claimable_tasks(store: &Store, agent: &str) -> EngineResult<Vec<Task>> {
    let agent_row = store
        .get_agent(agent)?
        .ok_or_else(|| EngineError::blocked(format!("{agent} is not registered")))?;
    let class = AgentClass::from_str(&agent_row.class).ok();

    // P1: tasks already assigned to this agent, in an active (non-terminal) status.
    let mut candidates: Vec<Task> = store
        .tasks_assigned_to(agent)?
        .into_iter()
        .filter(|t| !minion_core::TASK_TERMINAL_STATUSES.contains(&t.status.as_str()))
        .collect();

    if candidates.is_empty() {
        // P2: open tasks whose class_required matches this agent's class.
        candidates = store.open_tasks_for_class(&agent_row.class)?;
    }

    if candidates.is_empty() {
        // P3/P4: review-handoff stages offered to classes with `review` capability.
        if class.map(|c| c.has_capability(Capability::Review)).unwrap_or(false) {
            candidates = store
                .tasks_at_statuses(REVIEW_HANDOFF_STATUSES)?
                .into_iter()
                .filter(|t| t.assigned_to.is_none())
                .collect();
        }
    }

    let mut runnable = Vec::new();
    for task in candidates {
        if blockers_closed(store, &task)? {
            runnable.push(task);
        }
    }
    Ok(runnable)
}

fn blockers_closed(store: &Store, task: &Task) -> EngineResult<bool> {
    for id in task.blocked_by_ids() {
        match store.get_task(id)? {
            Some(blocker) if !minion_core::TASK_TERMINAL_STATUSES.contains(&blocker.status.as_str()) => {
                return Ok(false);
            }
            _ => {}
        }
    }
    Ok(true)
}
