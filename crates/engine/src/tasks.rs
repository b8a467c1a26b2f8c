// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task core: create / assign / pull / update / complete-phase and the
//! submit-result / review / test-report / block / done convenience
//! operations, plus `read_spec`/`define`/`lineage`.

use crate::error::{EngineError, EngineResult};
use crate::requirements;
use minion_core::{AgentClass, TASK_STATUSES, TASK_TERMINAL_STATUSES};
use minion_flow::gate::{all_gates_pass, check_gates, GateContext};
use minion_flow::transition::{apply_transition, TransitionRequest};
use minion_store::{NewTask, Store, Task, TransitionLogEntry};
use std::path::Path;
use std::str::FromStr;

fn flow_for(task: &Task) -> EngineResult<std::sync::Arc<minion_flow::Flow>> {
    minion_flow::registry::global().load(&task.flow_type).map_err(Into::into)
}

fn require_not_terminal(task: &Task) -> EngineResult<()> {
    if TASK_TERMINAL_STATUSES.contains(&task.status.as_str()) {
        return Err(EngineError::blocked(format!(
            "task {} is terminal ({})",
            task.id, task.status
        )));
    }
    Ok(())
}

fn require_agent(store: &Store, name: &str) -> EngineResult<minion_store::Agent> {
    store
        .get_agent(name)?
        .ok_or_else(|| EngineError::blocked(format!("{name} is not registered")))
}

fn require_lead(store: &Store, name: &str) -> EngineResult<()> {
    let agent = require_agent(store, name)?;
    if agent.class != AgentClass::Lead.as_str() {
        return Err(EngineError::blocked(format!("{name} is not the lead")));
    }
    Ok(())
}

fn require_no_moon_crash(store: &Store) -> EngineResult<()> {
    if store.flag_is_set(minion_store::FLAG_MOON_CRASH)? {
        return Err(EngineError::blocked("moon_crash is active"));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    store: &Store,
    work_dir: &Path,
    creator: &str,
    title: &str,
    task_file: &str,
    project: Option<&str>,
    zone: Option<&str>,
    blocked_by: &str,
    class_required: Option<&str>,
    flow_type: &str,
    task_type: &str,
    requirement_id: Option<i64>,
) -> EngineResult<Task> {
    let agent = require_agent(store, creator)?;
    if task_type != "chore" {
        if agent.class != AgentClass::Lead.as_str() {
            return Err(EngineError::blocked("only the lead may create non-chore tasks"));
        }
        if store.active_battle_plan()?.is_none() {
            return Err(EngineError::blocked("no active battle plan"));
        }
    }
    if !work_dir.join(task_file).exists() {
        return Err(EngineError::blocked(format!("task_file {task_file} does not exist")));
    }
    for raw_id in blocked_by.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id: i64 = raw_id
            .parse()
            .map_err(|_| EngineError::invalid(format!("blocked_by id {raw_id:?}")))?;
        if store.get_task(id)?.is_none() {
            return Err(EngineError::blocked(format!("blocked_by references unknown task {id}")));
        }
    }
    store
        .create_task(NewTask {
            title,
            task_file,
            project,
            zone,
            blocked_by,
            created_by: creator,
            class_required,
            flow_type,
            task_type,
            requirement_id,
        })
        .map_err(Into::into)
}

pub fn assign(store: &Store, lead: &str, task_id: i64, agent: &str) -> EngineResult<Task> {
    require_lead(store, lead)?;
    require_no_moon_crash(store)?;
    require_agent(store, agent)?;
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    require_not_terminal(&task)?;

    let flow = flow_for(&task)?;
    let is_handoff = flow.workers_for(&task.status).is_some();
    if is_handoff {
        store.assign_task(task_id, agent, None)?;
    } else {
        store.assign_task(task_id, agent, Some("assigned"))?;
    }
    store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::Other("assign produced no row".to_string()))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PulledTask {
    pub task: Task,
    pub content: String,
}

pub fn pull(store: &Store, work_dir: &Path, task_id: i64, agent: &str) -> EngineResult<PulledTask> {
    require_no_moon_crash(store)?;
    require_agent(store, agent)?;
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;

    for blocker_id in task.blocked_by_ids() {
        let blocker = store.get_task(blocker_id)?;
        let closed = blocker
            .map(|b| TASK_TERMINAL_STATUSES.contains(&b.status.as_str()))
            .unwrap_or(false);
        if !closed {
            return Err(EngineError::blocked(format!("unresolved blocker task {blocker_id}")));
        }
    }

    let flow = flow_for(&task)?;
    let reviewer_handoff = flow.workers_for(&task.status).is_some();

    let claimed = match store.pull_task(task_id, agent, reviewer_handoff)? {
        minion_store::PullOutcome::Claimed(task) => task,
        minion_store::PullOutcome::RaceLost => return Err(EngineError::RaceLost),
    };
    store.touch_context_updated(agent)?;

    let content = std::fs::read_to_string(work_dir.join(&claimed.task_file)).unwrap_or_default();
    Ok(PulledTask { task: claimed, content })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UpdateOutcome {
    pub task: Task,
    pub warnings: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    store: &Store,
    task_id: i64,
    new_status: Option<&str>,
    progress: Option<&str>,
    result_file: Option<&str>,
    files: Option<&str>,
    triggered_by: &str,
) -> EngineResult<UpdateOutcome> {
    let before = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    require_not_terminal(&before)?;

    if let Some(status) = new_status {
        if !TASK_STATUSES.contains(&status) {
            return Err(EngineError::invalid(format!("status {status:?}")));
        }
        if TASK_TERMINAL_STATUSES.contains(&status) {
            return Err(EngineError::invalid("use close instead of update for a terminal status"));
        }
    }

    let mut warnings = Vec::new();
    let flow = flow_for(&before)?;
    if let Some(status) = new_status {
        if !flow.valid_transitions(&before.status).contains(&status.to_string()) {
            warnings.push(format!("skipped-steps: {} is not a direct successor of {}", status, before.status));
        }
    }
    if before.assigned_to.as_deref() != Some(triggered_by) {
        warnings.push(format!("ownership mismatch: task assigned to {:?}, update by {triggered_by}", before.assigned_to));
    }
    if new_status == Some("fixed") && result_file.is_none() && before.result_file.is_none() {
        warnings.push("marking fixed without a result_file".to_string());
    }
    if new_status == Some("in_progress") {
        warnings.push("claim the files you intend to edit before starting work".to_string());
    }

    let after = store.update_task(task_id, new_status, progress, result_file, files, triggered_by, true)?;
    if after.activity_count >= 4 {
        warnings.push(format!("task has {} activity updates and may be dragging", after.activity_count));
    }

    if let Some(agent) = store.get_agent(triggered_by)? {
        if let Ok(class) = AgentClass::from_str(&agent.class) {
            if let Some(updated) = agent.context_updated_at.as_deref() {
                if let Some(age) = minion_core::seconds_since(updated) {
                    if age as u64 > class.staleness_seconds() {
                        warnings.push(format!("{triggered_by}'s context is stale ({age}s)"));
                    }
                }
            }
        }
    }

    Ok(UpdateOutcome { task: after, warnings })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CompletePhaseOutcome {
    pub task: Task,
    pub from_stage: String,
    pub to_stage: String,
    pub terminal: bool,
    pub parked: bool,
}

pub fn complete_phase(
    store: &Store,
    work_dir: &Path,
    task_id: i64,
    passed: bool,
    reason: Option<&str>,
    triggered_by: &str,
) -> EngineResult<CompletePhaseOutcome> {
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    require_not_terminal(&task)?;

    let flow = flow_for(&task)?;
    let transition = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &task.status,
            passed,
            use_alt: false,
            explicit_target: None,
        },
    )?;

    let target_stage = flow.get_stage(&transition.to_stage).ok_or_else(|| {
        EngineError::Other(format!("resolved stage {} missing from flow", transition.to_stage))
    })?;
    if !target_stage.requires.is_empty() {
        let ctx = GateContext {
            store,
            context_dir: work_dir,
            task_id: Some(task_id),
            requirement_id: task.requirement_id,
        };
        let results = check_gates(&target_stage.requires, &ctx)?;
        if !all_gates_pass(&results) {
            let failed: Vec<String> = results.iter().filter(|r| !r.passed).map(|r| r.gate.clone()).collect();
            return Err(EngineError::TransitionBlocked(failed.join(", ")));
        }
    }

    let progress = if transition.to_stage == "blocked" {
        let reason = reason.ok_or_else(|| EngineError::invalid("blocked requires a reason"))?;
        Some(reason)
    } else {
        None
    };

    let eligible_classes = flow.workers_for(&transition.to_stage);
    let updated = store.update_task(task_id, Some(&transition.to_stage), progress, None, None, triggered_by, true)?;
    if eligible_classes.is_some() {
        store.clear_assignment(task_id)?;
    }

    if TASK_TERMINAL_STATUSES.contains(&updated.status.as_str()) {
        if let Some(requirement_id) = updated.requirement_id {
            requirements::rollup_from_task_close(store, work_dir, requirement_id)?;
        }
    }

    Ok(CompletePhaseOutcome {
        task: updated,
        from_stage: transition.from_stage,
        to_stage: transition.to_stage,
        terminal: transition.terminal,
        parked: transition.parked,
    })
}

fn write_artifact(work_dir: &Path, subdir: &str, task_id: i64, content: &str) -> EngineResult<String> {
    let now = minion_core::now_iso();
    let rel = format!(".work/{subdir}/{task_id}-{now}.md", now = now.replace([':', '.'], "-"));
    minion_core::atomic_write(&work_dir.join(&rel), content)?;
    Ok(rel)
}

pub fn submit_result(store: &Store, work_dir: &Path, task_id: i64, triggered_by: &str, content: &str) -> EngineResult<Task> {
    let rel = write_artifact(work_dir, "results", task_id, content)?;
    store.update_task(task_id, None, None, Some(&rel), None, triggered_by, true).map_err(Into::into)
}

pub fn review(
    store: &Store,
    work_dir: &Path,
    task_id: i64,
    triggered_by: &str,
    passed: bool,
    content: &str,
) -> EngineResult<CompletePhaseOutcome> {
    write_artifact(work_dir, "reviews", task_id, content)?;
    complete_phase(store, work_dir, task_id, passed, None, triggered_by)
}

pub fn test_report(
    store: &Store,
    work_dir: &Path,
    task_id: i64,
    triggered_by: &str,
    passed: bool,
    content: &str,
) -> EngineResult<CompletePhaseOutcome> {
    write_artifact(work_dir, "test-reports", task_id, content)?;
    complete_phase(store, work_dir, task_id, passed, None, triggered_by)
}

pub fn block(
    store: &Store,
    work_dir: &Path,
    task_id: i64,
    triggered_by: &str,
    reason: &str,
    content: &str,
) -> EngineResult<CompletePhaseOutcome> {
    write_artifact(work_dir, "blocks", task_id, content)?;
    complete_phase(store, work_dir, task_id, false, Some(reason), triggered_by)
}

/// Lead-only fast close, bypassing the DAG.
pub fn done(store: &Store, work_dir: &Path, lead: &str, task_id: i64, summary: Option<&str>) -> EngineResult<Task> {
    require_lead(store, lead)?;
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    require_not_terminal(&task)?;
    let closed = store.force_close(task_id, lead, summary)?;
    if let Some(requirement_id) = closed.requirement_id {
        requirements::rollup_from_task_close(store, work_dir, requirement_id)?;
    }
    Ok(closed)
}

pub fn close(store: &Store, work_dir: &Path, task_id: i64, status: &str, triggered_by: &str) -> EngineResult<Task> {
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    require_not_terminal(&task)?;
    if task.result_file.is_none() {
        return Err(EngineError::blocked("close_task requires a result_file; use done for a lead fast-close"));
    }
    let closed = store.close_task(task_id, status, triggered_by)?;
    if let Some(requirement_id) = closed.requirement_id {
        requirements::rollup_from_task_close(store, work_dir, requirement_id)?;
    }
    Ok(closed)
}

pub fn reopen(store: &Store, lead: &str, task_id: i64, to_status: &str) -> EngineResult<Task> {
    require_lead(store, lead)?;
    store.reopen_task(task_id, to_status, lead).map_err(Into::into)
}

/// Inline the task's own spec/description file.
pub fn read_spec(store: &Store, work_dir: &Path, task_id: i64) -> EngineResult<String> {
    let task = store
        .get_task(task_id)?
        .ok_or_else(|| EngineError::blocked(format!("task {task_id} not found")))?;
    std::fs::read_to_string(work_dir.join(&task.task_file)).map_err(Into::into)
}

/// Lead-only create-spec-file-and-row in one call.
#[allow(clippy::too_many_arguments)]
pub fn define(
    store: &Store,
    work_dir: &Path,
    lead: &str,
    title: &str,
    task_file: &str,
    spec_body: &str,
    flow_type: &str,
    task_type: &str,
    class_required: Option<&str>,
    requirement_id: Option<i64>,
) -> EngineResult<Task> {
    require_lead(store, lead)?;
    minion_core::atomic_write(&work_dir.join(task_file), spec_body)?;
    create(
        store,
        work_dir,
        lead,
        title,
        task_file,
        None,
        None,
        "",
        class_required,
        flow_type,
        task_type,
        requirement_id,
    )
}

/// Ordered (stage, agent, timestamp) lineage for a task.
pub fn lineage(store: &Store, task_id: i64) -> EngineResult<Vec<TransitionLogEntry>> {
    store.transition_log_for("task", task_id).map_err(Into::into)
}
