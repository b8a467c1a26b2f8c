// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::test_support::fixture;
use crate::{tasks, EngineError};

#[test]
fn create_rejects_non_chore_without_active_plan() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    let task_file = f.seed_file("tasks/widget.md", "# widget\n");

    let err = tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Build the widget",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "feature",
        None,
    )
    .expect_err("no active plan");
    assert!(matches!(err, EngineError::Blocked(_)));
}

#[test]
fn create_rejects_non_lead_for_feature_tasks() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");
    let task_file = f.seed_file("tasks/widget.md", "# widget\n");

    let err = tasks::create(
        &f.store,
        f.work_dir.path(),
        "coder-1",
        "Build the widget",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "feature",
        None,
    )
    .expect_err("coder cannot create a feature task");
    assert!(err.to_string().contains("only the lead"));
}

#[test]
fn create_allows_chore_from_any_registered_agent_without_a_plan() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    let task_file = f.seed_file("tasks/chore.md", "# chore\n");

    let task = tasks::create(
        &f.store,
        f.work_dir.path(),
        "coder-1",
        "Tidy up",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "chore",
        None,
    )
    .expect("chore task creation");
    assert_eq!(task.status, "open");
}

#[test]
fn create_rejects_unknown_blocker_id() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");
    let task_file = f.seed_file("tasks/widget.md", "# widget\n");

    let err = tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Build the widget",
        &task_file,
        None,
        None,
        "999",
        None,
        "task",
        "feature",
        None,
    )
    .expect_err("blocker does not exist");
    assert!(err.to_string().contains("unknown task"));
}

fn make_task(f: &crate::test_support::Fixture) -> i64 {
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");
    let task_file = f.seed_file("tasks/widget.md", "# widget\n");
    tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Build the widget",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "feature",
        None,
    )
    .expect("create")
    .id
}

#[test]
fn pull_is_race_safe_second_caller_loses() {
    let f = fixture();
    let task_id = make_task(&f);
    f.register_fresh("coder-1", "coder");
    f.register_fresh("coder-2", "coder");

    let first = tasks::pull(&f.store, f.work_dir.path(), task_id, "coder-1").expect("first pull");
    assert_eq!(first.task.assigned_to.as_deref(), Some("coder-1"));

    let second = tasks::pull(&f.store, f.work_dir.path(), task_id, "coder-2");
    assert!(matches!(second, Err(EngineError::RaceLost)));
}

#[test]
fn pull_blocks_on_unresolved_blocker() {
    let f = fixture();
    let blocker_id = make_task(&f);
    let task_file = f.seed_file("tasks/blocked.md", "# blocked thing\n");
    let blocked = tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Depends on widget",
        &task_file,
        None,
        None,
        &blocker_id.to_string(),
        None,
        "task",
        "feature",
        None,
    )
    .expect("create dependent");

    f.register_fresh("coder-1", "coder");
    let err = tasks::pull(&f.store, f.work_dir.path(), blocked.id, "coder-1").expect_err("blocker still open");
    assert!(err.to_string().contains("unresolved blocker"));
}

#[test]
fn complete_phase_enforces_submit_result_gate() {
    let f = fixture();
    let task_id = make_task(&f);
    f.register_fresh("coder-1", "coder");
    tasks::pull(&f.store, f.work_dir.path(), task_id, "coder-1").expect("pull");
    tasks::complete_phase(&f.store, f.work_dir.path(), task_id, true, None, "coder-1").expect("open->assigned");
    tasks::complete_phase(&f.store, f.work_dir.path(), task_id, true, None, "coder-1")
        .expect("assigned->in_progress");

    let err = tasks::complete_phase(&f.store, f.work_dir.path(), task_id, true, None, "coder-1")
        .expect_err("fixed requires a filed result");
    assert!(matches!(err, EngineError::TransitionBlocked(_)));
    assert!(err.to_string().contains("submit_result"));

    tasks::submit_result(&f.store, f.work_dir.path(), task_id, "coder-1", "all done").expect("submit result");
    let advanced = tasks::complete_phase(&f.store, f.work_dir.path(), task_id, true, None, "coder-1")
        .expect("now it passes");
    assert_eq!(advanced.to_stage, "fixed");
}

#[test]
fn close_requires_result_file_done_bypasses_it() {
    let f = fixture();
    let task_id = make_task(&f);

    let err = tasks::close(&f.store, f.work_dir.path(), task_id, "closed", "lead-1")
        .expect_err("no result_file yet");
    assert!(err.to_string().contains("use done"));

    let closed = tasks::done(&f.store, f.work_dir.path(), "lead-1", task_id, Some("fast closed")).expect("done");
    assert_eq!(closed.status, "closed");
}

#[test]
fn terminal_tasks_reject_further_updates() {
    let f = fixture();
    let task_id = make_task(&f);
    tasks::done(&f.store, f.work_dir.path(), "lead-1", task_id, None).expect("done");

    let err = tasks::update(&f.store, task_id, Some("in_progress"), None, None, None, "lead-1")
        .expect_err("terminal task cannot be updated");
    assert!(err.to_string().contains("terminal"));
}

#[test]
fn lineage_records_every_transition() {
    let f = fixture();
    let task_id = make_task(&f);
    f.register_fresh("coder-1", "coder");
    tasks::pull(&f.store, f.work_dir.path(), task_id, "coder-1").expect("pull");
    tasks::complete_phase(&f.store, f.work_dir.path(), task_id, true, None, "coder-1").expect("advance");

    let lineage = tasks::lineage(&f.store, task_id).expect("lineage");
    assert!(lineage.len() >= 2, "expected at least create + one transition, got {lineage:?}");
}
