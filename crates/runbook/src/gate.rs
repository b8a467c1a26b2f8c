// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate checks run when entering a target stage . Dispatch is
//! by gate *name*, in this order:
//!
//! 1. a known structural filesystem check (`numbered_child_folders`,
//!    `impl_task_readmes`)
//! 2. a known DB aggregate check (`all_inv_tasks_closed`,
//!    `all_impl_tasks_closed`, `all_leaves_have_tasks`)
//! 3. a known task-row precondition (`submit_result`)
//! 4. otherwise: the filesystem-artifact default — the name is a glob
//!    rooted at the entity's context directory, passing iff at least one
//!    match exists and every matched regular file is non-empty.

use crate::error::FlowResult;
use minion_store::Store;
use std::path::Path;

/// Task statuses counted as "done" for the `all_*_tasks_closed` aggregate
/// gates. A superset of
/// [`minion_core::TASK_TERMINAL_STATUSES`] — `completed` is included for
/// forward compatibility even though no shipped flow currently names a
/// task stage `completed`.
const AGGREGATE_CLOSED_STATUSES: &[&str] = &["closed", "abandoned", "obsolete", "completed"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub gate: String,
    pub passed: bool,
    pub message: String,
}

impl GateResult {
    fn pass(gate: &str) -> Self {
        Self {
            gate: gate.to_string(),
            passed: true,
            message: String::new(),
        }
    }

    fn fail(gate: &str, message: impl Into<String>) -> Self {
        Self {
            gate: gate.to_string(),
            passed: false,
            message: message.into(),
        }
    }
}

/// What a gate is checked against: the entity's artifact directory (task
/// directory for tasks, requirement folder for requirements) plus the row
/// identifiers needed for the DB aggregate and task-precondition kinds.
pub struct GateContext<'a> {
    pub store: &'a Store,
    pub context_dir: &'a Path,
    pub task_id: Option<i64>,
    pub requirement_id: Option<i64>,
}

pub fn check_gate(name: &str, ctx: &GateContext<'_>) -> FlowResult<GateResult> {
    let result = match name {
        "numbered_child_folders" => check_numbered_child_folders(name, ctx.context_dir),
        "impl_task_readmes" => check_impl_task_readmes(name, ctx.context_dir),
        "all_inv_tasks_closed" => check_all_descendant_tasks_closed(name, ctx, Some("requirement"))?,
        "all_impl_tasks_closed" => check_all_descendant_tasks_closed(name, ctx, Some("task"))?,
        "all_leaves_have_tasks" => check_all_leaves_have_tasks(name, ctx)?,
        "submit_result" => check_task_precondition(name, ctx, "result_file")?,
        other => check_filesystem_artifact(other, ctx.context_dir),
    };
    Ok(result)
}

pub fn check_gates(names: &[String], ctx: &GateContext<'_>) -> FlowResult<Vec<GateResult>> {
    names.iter().map(|n| check_gate(n, ctx)).collect()
}

pub fn all_gates_pass(results: &[GateResult]) -> bool {
    results.iter().all(|r| r.passed)
}

fn check_filesystem_artifact(pattern: &str, context_dir: &Path) -> GateResult {
    let full_pattern = context_dir.join(pattern).to_string_lossy().to_string();
    let paths: Vec<std::path::PathBuf> = match glob::glob(&full_pattern) {
        Ok(iter) => iter.filter_map(Result::ok).collect(),
        Err(e) => return GateResult::fail(pattern, format!("invalid glob {pattern:?}: {e}")),
    };
    if paths.is_empty() {
        return GateResult::fail(pattern, format!("no file matched {pattern:?}"));
    }
    for path in &paths {
        if path.is_file() {
            match std::fs::metadata(path) {
                Ok(meta) if meta.len() == 0 => {
                    return GateResult::fail(pattern, format!("{} is empty", path.display()));
                }
                Err(e) => return GateResult::fail(pattern, format!("{}: {e}", path.display())),
                _ => {}
            }
        }
    }
    GateResult::pass(pattern)
}

fn check_numbered_child_folders(name: &str, context_dir: &Path) -> GateResult {
    let has_one = std::fs::read_dir(context_dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path().is_dir()
                    && e.file_name()
                        .to_str()
                        .map(|n| is_numbered_child_name(n))
                        .unwrap_or(false)
            })
        })
        .unwrap_or(false);
    if has_one {
        GateResult::pass(name)
    } else {
        GateResult::fail(name, "no NNN-* child folder exists")
    }
}

fn is_numbered_child_name(name: &str) -> bool {
    let Some((digits, rest)) = name.split_once('-') else {
        return false;
    };
    digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty()
}

fn check_impl_task_readmes(name: &str, context_dir: &Path) -> GateResult {
    let children: Vec<std::path::PathBuf> = std::fs::read_dir(context_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_dir()
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .map(is_numbered_child_name)
                            .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();
    let missing: Vec<String> = children
        .iter()
        .filter(|dir| !dir.join("README.md").is_file())
        .map(|dir| dir.display().to_string())
        .collect();
    if missing.is_empty() {
        GateResult::pass(name)
    } else {
        GateResult::fail(name, format!("missing README.md in: {}", missing.join(", ")))
    }
}

fn check_all_descendant_tasks_closed(
    name: &str,
    ctx: &GateContext<'_>,
    flow_type_filter: Option<&str>,
) -> FlowResult<GateResult> {
    let Some(requirement_id) = ctx.requirement_id else {
        return Ok(GateResult::fail(name, "no requirement in context"));
    };
    let Some(requirement) = ctx.store.get_requirement(requirement_id)? else {
        return Ok(GateResult::fail(name, format!("requirement {requirement_id} not found")));
    };
    let mut ids = ctx.store.descendant_ids(&requirement)?;
    if !ids.contains(&requirement_id) {
        ids.push(requirement_id);
    }
    let tasks = ctx.store.tasks_for_requirement_ids(&ids, flow_type_filter)?;
    let open: Vec<i64> = tasks
        .iter()
        .filter(|t| !AGGREGATE_CLOSED_STATUSES.contains(&t.status.as_str()))
        .map(|t| t.id)
        .collect();
    if open.is_empty() {
        Ok(GateResult::pass(name))
    } else {
        Ok(GateResult::fail(
            name,
            format!("{} task(s) still open: {:?}", open.len(), open),
        ))
    }
}

fn check_all_leaves_have_tasks(name: &str, ctx: &GateContext<'_>) -> FlowResult<GateResult> {
    let Some(requirement_id) = ctx.requirement_id else {
        return Ok(GateResult::fail(name, "no requirement in context"));
    };
    let children = ctx.store.children_of(requirement_id)?;
    let mut without_tasks = Vec::new();
    for child in &children {
        let tasks = ctx.store.tasks_for_requirement_ids(&[child.id], None)?;
        if tasks.is_empty() {
            without_tasks.push(child.file_path.clone());
        }
    }
    if without_tasks.is_empty() {
        Ok(GateResult::pass(name))
    } else {
        Ok(GateResult::fail(
            name,
            format!("leaves with no task: {}", without_tasks.join(", ")),
        ))
    }
}

fn check_task_precondition(name: &str, ctx: &GateContext<'_>, column: &str) -> FlowResult<GateResult> {
    let Some(task_id) = ctx.task_id else {
        return Ok(GateResult::fail(name, "no task in context"));
    };
    let Some(task) = ctx.store.get_task(task_id)? else {
        return Ok(GateResult::fail(name, format!("task {task_id} not found")));
    };
    let satisfied = match column {
        "result_file" => task.result_file.is_some(),
        _ => false,
    };
    if satisfied {
        Ok(GateResult::pass(name))
    } else {
        Ok(GateResult::fail(name, format!("task {task_id} has no {column}")))
    }
}
