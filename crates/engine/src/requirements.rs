// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requirements core: register/reindex, promote-from-backlog, decompose,
//! itemize/findings, parent-child rollup, and the `report` rollup.

use crate::error::{EngineError, EngineResult};
use minion_core::AgentClass;
use minion_flow::gate::{all_gates_pass, check_gates, GateContext};
use minion_flow::transition::{apply_transition, TransitionRequest};
use minion_store::{NewRequirement, NewTask, Requirement, Store};
use std::path::Path;
use std::str::FromStr;

const TERMINAL_TASK_SET: &[&str] = &["closed", "abandoned", "obsolete", "completed"];

pub fn register(
    store: &Store,
    file_path: &str,
    origin: &str,
    flow_type: &str,
    parent_id: Option<i64>,
    created_by: &str,
    stage: &str,
) -> EngineResult<Requirement> {
    if store.get_requirement_by_path(file_path)?.is_some() {
        return Err(EngineError::invalid(format!("requirement {file_path} already registered")));
    }
    store
        .register_requirement(NewRequirement {
            file_path,
            origin,
            flow_type,
            parent_id,
            created_by,
            stage,
        })
        .map_err(Into::into)
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReindexOutcome {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Walks `<requirements_root>` registering any folder with a README.md not
/// already in the DB, inferring stage from filesystem signals. Idempotent:
/// a second run registers nothing new.
pub fn reindex(store: &Store, requirements_root: &Path, created_by: &str) -> EngineResult<ReindexOutcome> {
    let mut outcome = ReindexOutcome::default();
    if !requirements_root.is_dir() {
        return Ok(outcome);
    }
    let mut stack = vec![requirements_root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if path.join("README.md").is_file() {
                let rel = path
                    .strip_prefix(requirements_root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                if store.get_requirement_by_path(&rel)?.is_some() {
                    outcome.skipped.push(rel);
                } else {
                    let has_children = std::fs::read_dir(&path)
                        .map(|mut it| it.any(|e| e.ok().map(|e| e.path().is_dir()).unwrap_or(false)))
                        .unwrap_or(false);
                    let stage = if has_children {
                        "tasked"
                    } else if path.join("itemized-requirements.md").is_file() {
                        "decomposing"
                    } else {
                        "seed"
                    };
                    let origin = rel.split('/').next().unwrap_or("unknown").trim_end_matches('s').to_string();
                    store.register_requirement(NewRequirement {
                        file_path: &rel,
                        origin: &origin,
                        flow_type: "requirement",
                        parent_id: None,
                        created_by,
                        stage,
                    })?;
                    outcome.registered.push(rel);
                }
            }
            stack.push(path);
        }
    }
    Ok(outcome)
}

/// Copies a backlog item's README into a new requirement folder and
/// registers it, updating the backlog row to `promoted`. Rolls back the
/// created folder if registration fails.
pub fn promote_from_backlog(
    store: &Store,
    work_dir: &Path,
    backlog_file_path: &str,
    created_by: &str,
) -> EngineResult<Requirement> {
    let item = store
        .get_backlog_item(backlog_file_path)?
        .ok_or_else(|| EngineError::blocked(format!("backlog item {backlog_file_path} not found")))?;
    if item.status == "promoted" {
        return Err(EngineError::blocked(format!("{backlog_file_path} is already promoted")));
    }

    let origin = if item.item_type == "bug" { "bugs" } else { "features" };
    let slug = item
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(&item.title)
        .trim_end_matches(".md")
        .to_string();
    let req_rel = format!("{origin}/{slug}");
    let req_dir = work_dir.join("requirements").join(&req_rel);
    let source_readme = work_dir.join(&item.file_path);
    let dest_readme = req_dir.join("README.md");

    let content = std::fs::read_to_string(&source_readme).unwrap_or_else(|_| format!("# {}\n", item.title));
    minion_core::atomic_write(&dest_readme, &content)?;

    match register(store, &req_rel, origin, "requirement", None, created_by, "seed") {
        Ok(req) => {
            store.set_backlog_status(backlog_file_path, "promoted", Some(&req_rel))?;
            Ok(req)
        }
        Err(e) => {
            let _ = std::fs::remove_dir_all(&req_dir);
            Err(e)
        }
    }
}

pub struct DecomposeChild<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub task_type: Option<&'a str>,
    /// 1-based indices into the sibling child list this one is blocked by.
    pub blocked_by: Vec<usize>,
}

/// Creates a child requirement folder + task per entry, wires `blocked_by`
/// indices to task ids, then advances the parent to `tasked`.
pub fn decompose(
    store: &Store,
    work_dir: &Path,
    parent_id: i64,
    children: &[DecomposeChild<'_>],
    created_by: &str,
) -> EngineResult<Vec<Requirement>> {
    let parent = store
        .get_requirement(parent_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {parent_id} not found")))?;

    let mut child_reqs = Vec::new();
    let mut child_task_ids = Vec::new();
    for (i, child) in children.iter().enumerate() {
        let rel = format!("{}/{:03}-{}", parent.file_path, i + 1, child.slug);
        let readme = format!(
            "# {}\n\n{}\n",
            child.title,
            child.description.unwrap_or("")
        );
        minion_core::atomic_write(&work_dir.join("requirements").join(&rel).join("README.md"), &readme)?;
        let req = register(store, &rel, &parent.origin, &parent.flow_type, Some(parent.id), created_by, "seed")?;

        let task_file = format!("task-specs/{}.md", child.slug);
        minion_core::atomic_write(&work_dir.join(&task_file), &readme)?;
        let task = store.create_task(NewTask {
            title: child.title,
            task_file: &task_file,
            project: None,
            zone: None,
            blocked_by: "",
            created_by,
            class_required: None,
            flow_type: "task",
            task_type: child.task_type.unwrap_or("feature"),
            requirement_id: Some(req.id),
        })?;
        child_reqs.push(req);
        child_task_ids.push(task.id);
    }

    for (i, child) in children.iter().enumerate() {
        if child.blocked_by.is_empty() {
            continue;
        }
        let blockers: Vec<String> = child
            .blocked_by
            .iter()
            .filter_map(|idx| child_task_ids.get(idx.wrapping_sub(1)).map(|id| id.to_string()))
            .collect();
        if !blockers.is_empty() {
            store.set_task_blocked_by(child_task_ids[i], &blockers.join(","))?;
        }
    }

    let flow = minion_flow::registry::global().load(&parent.flow_type)?;
    let transition = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &parent.stage,
            passed: true,
            use_alt: false,
            explicit_target: Some("tasked"),
        },
    )?;
    if !gates_pass_for(store, work_dir, &parent, &transition.to_stage)? {
        return Err(EngineError::TransitionBlocked(transition.to_stage));
    }
    store.set_requirement_stage(parent.id, &transition.to_stage)?;
    store.append_transition_log("requirement", parent.id, Some(&parent.stage), &transition.to_stage, created_by)?;
    Ok(child_reqs)
}

pub fn itemize(store: &Store, work_dir: &Path, requirement_id: i64, items: &[String]) -> EngineResult<()> {
    let req = store
        .get_requirement(requirement_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let mut body = String::from("# Itemized Requirements\n\n");
    for item in items {
        body.push_str(&format!("- {item}\n"));
    }
    minion_core::atomic_write(
        &work_dir.join("requirements").join(&req.file_path).join("itemized-requirements.md"),
        &body,
    )?;
    let flow = minion_flow::registry::global().load(&req.flow_type)?;
    let transition = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &req.stage,
            passed: true,
            use_alt: false,
            explicit_target: Some("itemized"),
        },
    )?;
    if !gates_pass_for(store, work_dir, &req, &transition.to_stage)? {
        return Err(EngineError::TransitionBlocked(transition.to_stage));
    }
    store.set_requirement_stage(requirement_id, &transition.to_stage)?;
    store.append_transition_log("requirement", requirement_id, Some(&req.stage), &transition.to_stage, "itemize")?;
    Ok(())
}

pub fn findings(
    store: &Store,
    work_dir: &Path,
    requirement_id: i64,
    root_cause: &str,
    evidence: &str,
    recommendation: &str,
) -> EngineResult<()> {
    let req = store
        .get_requirement(requirement_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let body = format!(
        "# Findings\n\n## Root cause\n{root_cause}\n\n## Evidence\n{evidence}\n\n## Recommendation\n{recommendation}\n"
    );
    minion_core::atomic_write(&work_dir.join("requirements").join(&req.file_path).join("findings.md"), &body)?;
    let flow = minion_flow::registry::global().load(&req.flow_type)?;
    let transition = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &req.stage,
            passed: true,
            use_alt: false,
            explicit_target: Some("decomposing"),
        },
    )?;
    if !gates_pass_for(store, work_dir, &req, &transition.to_stage)? {
        return Err(EngineError::TransitionBlocked(transition.to_stage));
    }
    store.set_requirement_stage(requirement_id, &transition.to_stage)?;
    store.append_transition_log("requirement", requirement_id, Some(&req.stage), &transition.to_stage, "findings")?;
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RollupResult {
    pub requirement_id: i64,
    pub from_stage: String,
    pub to_stage: Option<String>,
    pub advanced: bool,
}

/// Attempts to advance `requirement_id` and, recursively, its ancestors when
/// every direct child task is in the terminal set. Gate or transition
/// failures abort the chain silently — this is a best-effort rollup, never
/// a hard error.
pub fn rollup_from_task_close(store: &Store, work_dir: &Path, requirement_id: i64) -> EngineResult<Vec<RollupResult>> {
    let mut results = Vec::new();
    let mut current = Some(requirement_id);
    while let Some(id) = current {
        let Some(req) = store.get_requirement(id)? else { break };
        let siblings = store.tasks_for_requirement_ids(&[id], None)?;
        let all_terminal = !siblings.is_empty()
            && siblings.iter().all(|t| TERMINAL_TASK_SET.contains(&t.status.as_str()));
        if !all_terminal {
            break;
        }

        let advanced = try_advance(store, work_dir, &req)?;
        let stopped = !advanced.advanced;
        results.push(advanced);
        if stopped {
            break;
        }
        current = req.parent_id;
    }
    Ok(results)
}

fn try_advance(store: &Store, work_dir: &Path, req: &Requirement) -> EngineResult<RollupResult> {
    let flow = match minion_flow::registry::global().load(&req.flow_type) {
        Ok(f) => f,
        Err(_) => {
            return Ok(RollupResult {
                requirement_id: req.id,
                from_stage: req.stage.clone(),
                to_stage: None,
                advanced: false,
            })
        }
    };
    let Ok(transition) = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &req.stage,
            passed: true,
            use_alt: false,
            explicit_target: None,
        },
    ) else {
        return Ok(RollupResult {
            requirement_id: req.id,
            from_stage: req.stage.clone(),
            to_stage: None,
            advanced: false,
        });
    };

    let target = flow.get_stage(&transition.to_stage);
    let gates_pass = match target {
        Some(stage) if !stage.requires.is_empty() => {
            let ctx = GateContext {
                store,
                context_dir: &work_dir.join("requirements").join(&req.file_path),
                task_id: None,
                requirement_id: Some(req.id),
            };
            all_gates_pass(&check_gates(&stage.requires, &ctx)?)
        }
        _ => true,
    };
    if !gates_pass {
        return Ok(RollupResult {
            requirement_id: req.id,
            from_stage: req.stage.clone(),
            to_stage: None,
            advanced: false,
        });
    }

    store.set_requirement_stage(req.id, &transition.to_stage)?;
    store.append_transition_log("requirement", req.id, Some(&req.stage), &transition.to_stage, "rollup")?;
    Ok(RollupResult {
        requirement_id: req.id,
        from_stage: req.stage.clone(),
        to_stage: Some(transition.to_stage),
        advanced: true,
    })
}

/// Rolls a requirement subtree into one markdown status report.
pub fn report(store: &Store, requirement_id: i64) -> EngineResult<String> {
    let root = store
        .get_requirement(requirement_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let descendant_ids = store.descendant_ids(&root)?;
    let tasks = store.tasks_for_requirement_ids(&descendant_ids, None)?;
    let open = tasks.iter().filter(|t| !TERMINAL_TASK_SET.contains(&t.status.as_str())).count();
    let closed = tasks.len() - open;
    let children = store.children_of(root.id)?;

    let mut out = format!("# {}\n\nstage: {}\n\n", root.file_path, root.stage);
    out.push_str(&format!("tasks: {open} open, {closed} closed ({} total)\n\n", tasks.len()));
    if !children.is_empty() {
        out.push_str("## Children\n\n");
        for child in &children {
            out.push_str(&format!("- {} ({})\n", child.file_path, child.stage));
        }
    }
    Ok(out)
}

fn require_lead_class(store: &Store, name: &str) -> EngineResult<()> {
    let agent = store
        .get_agent(name)?
        .ok_or_else(|| EngineError::blocked(format!("{name} is not registered")))?;
    if AgentClass::from_str(&agent.class).ok() != Some(AgentClass::Lead) {
        return Err(EngineError::blocked(format!("{name} is not the lead")));
    }
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UpdateStageOutcome {
    pub from_stage: String,
    pub to_stage: String,
    pub auto_advanced: Vec<String>,
}

/// Explicit-target requirement transition plus the auto-advance policy
/// : after the explicit hop, keep walking forward while the
/// current stage is non-terminal, non-parked, has no `workers`, and no
/// `requires` — stopping at the first real checkpoint or gate failure.
pub fn update_stage(
    store: &Store,
    work_dir: &Path,
    requirement_id: i64,
    triggered_by: &str,
    passed: bool,
    use_alt: bool,
    explicit_target: Option<&str>,
) -> EngineResult<UpdateStageOutcome> {
    let req = store
        .get_requirement(requirement_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let flow = minion_flow::registry::global().load(&req.flow_type)?;

    let transition = apply_transition(
        &flow,
        TransitionRequest {
            current_stage: &req.stage,
            passed,
            use_alt,
            explicit_target,
        },
    )?;
    if !gates_pass_for(store, work_dir, &req, &transition.to_stage)? {
        return Err(EngineError::TransitionBlocked(transition.to_stage));
    }
    store.set_requirement_stage(req.id, &transition.to_stage)?;
    store.append_transition_log("requirement", req.id, Some(&req.stage), &transition.to_stage, triggered_by)?;

    let mut current = transition.to_stage.clone();
    let mut auto_advanced = Vec::new();
    loop {
        let Some(stage) = flow.get_stage(&current) else { break };
        if stage.terminal || stage.parked || stage.workers.is_some() || !stage.requires.is_empty() {
            break;
        }
        let Some(next) = flow.next_status(&current, true) else { break };
        let req_now = minion_store::Requirement { stage: current.clone(), ..req.clone() };
        if !gates_pass_for(store, work_dir, &req_now, &next)? {
            break;
        }
        store.set_requirement_stage(req.id, &next)?;
        store.append_transition_log("requirement", req.id, Some(&current), &next, triggered_by)?;
        auto_advanced.push(next.clone());
        current = next;
    }

    Ok(UpdateStageOutcome {
        from_stage: req.stage,
        to_stage: current,
        auto_advanced,
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SkipWalkOutcome {
    pub from_stage: String,
    pub reached: String,
    pub requested: String,
    pub hit_target: bool,
}

/// Lead-only multi-hop shortcut: at each position, attempt a direct hop to
/// `target`; if that is not a valid transition, advance one happy-path
/// step and retry. Halts at the first
/// gate failure or invalid hop and returns the farthest stage reached.
pub fn skip_walk(store: &Store, work_dir: &Path, lead: &str, requirement_id: i64, target: &str) -> EngineResult<SkipWalkOutcome> {
    require_lead_class(store, lead)?;
    let mut req = store
        .get_requirement(requirement_id)?
        .ok_or_else(|| EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let flow = minion_flow::registry::global().load(&req.flow_type)?;
    let from_stage = req.stage.clone();

    loop {
        if req.stage == target {
            break;
        }
        let direct = flow.valid_transitions(&req.stage).contains(&target.to_string())
            && gates_pass_for(store, work_dir, &req, target)?;
        if direct {
            store.set_requirement_stage(req.id, target)?;
            store.append_transition_log("requirement", req.id, Some(&req.stage), target, lead)?;
            req.stage = target.to_string();
            break;
        }
        if flow.is_terminal(&req.stage) {
            break;
        }
        let Some(next) = flow.next_status(&req.stage, true) else { break };
        if !gates_pass_for(store, work_dir, &req, &next)? {
            break;
        }
        store.set_requirement_stage(req.id, &next)?;
        store.append_transition_log("requirement", req.id, Some(&req.stage), &next, lead)?;
        req.stage = next;
    }

    Ok(SkipWalkOutcome {
        from_stage,
        hit_target: req.stage == target,
        reached: req.stage,
        requested: target.to_string(),
    })
}

fn gates_pass_for(store: &Store, work_dir: &Path, req: &Requirement, target: &str) -> EngineResult<bool> {
    let flow = minion_flow::registry::global().load(&req.flow_type)?;
    Ok(match flow.get_stage(target) {
        Some(stage) if !stage.requires.is_empty() => {
            let ctx = GateContext {
                store,
                context_dir: &work_dir.join("requirements").join(&req.file_path),
                task_id: None,
                requirement_id: Some(req.id),
            };
            all_gates_pass(&check_gates(&stage.requires, &ctx)?)
        }
        _ => true,
    })
}
