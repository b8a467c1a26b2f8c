// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::test_support::fixture;
use crate::{backlog, requirements, tasks, EngineError};

#[test]
fn register_rejects_duplicate_path() {
    let f = fixture();
    requirements::register(&f.store, "features/widget", "features", "requirement", None, "lead-1", "seed")
        .expect("first registration");
    let err = requirements::register(&f.store, "features/widget", "features", "requirement", None, "lead-1", "seed")
        .expect_err("duplicate path");
    assert!(matches!(err, EngineError::Invalid(_)));
}

#[test]
fn reindex_is_idempotent() {
    let f = fixture();
    let root = f.work_dir.path().join("requirements");
    f.seed_file("requirements/features/widget/README.md", "# Widget\n");

    let first = requirements::reindex(&f.store, &root, "lead-1").expect("first reindex");
    assert_eq!(first.registered.len(), 1);
    assert!(first.skipped.is_empty());

    let second = requirements::reindex(&f.store, &root, "lead-1").expect("second reindex");
    assert!(second.registered.is_empty());
    assert_eq!(second.skipped.len(), 1);
}

#[test]
fn promote_from_backlog_copies_readme_and_marks_promoted() {
    let f = fixture();
    f.seed_file("backlog/bugs/login-crash/README.md", "# Login Crash\n\nRepro steps...\n");
    backlog::add(&f.store, "backlog/bugs/login-crash/README.md", "bug", "Login Crash", "high", None)
        .expect("add backlog item");

    let req = requirements::promote_from_backlog(&f.store, f.work_dir.path(), "backlog/bugs/login-crash/README.md", "lead-1")
        .expect("promote");
    assert_eq!(req.file_path, "bugs/login-crash");
    assert_eq!(req.stage, "seed");
    assert!(f.work_dir.path().join("requirements/bugs/login-crash/README.md").is_file());

    let item = backlog::show(&f.store, "backlog/bugs/login-crash/README.md").expect("show");
    assert_eq!(item.status, "promoted");
    assert_eq!(item.promoted_to.as_deref(), Some("bugs/login-crash"));

    let err = requirements::promote_from_backlog(&f.store, f.work_dir.path(), "backlog/bugs/login-crash/README.md", "lead-1")
        .expect_err("already promoted");
    assert!(err.to_string().contains("already promoted"));
}

#[test]
fn decompose_creates_children_and_wires_blocked_by() {
    let f = fixture();
    let parent = requirements::register(&f.store, "features/smoke-parent", "features", "requirement", None, "lead-1", "decomposing")
        .expect("register parent");

    let children = vec![
        requirements::DecomposeChild {
            slug: "impl-alpha",
            title: "Alpha",
            description: None,
            task_type: None,
            blocked_by: vec![],
        },
        requirements::DecomposeChild {
            slug: "impl-beta",
            title: "Beta",
            description: None,
            task_type: None,
            blocked_by: vec![1],
        },
    ];
    let created = requirements::decompose(&f.store, f.work_dir.path(), parent.id, &children, "lead-1").expect("decompose");
    assert_eq!(created.len(), 2);

    let reloaded_parent = f.store.get_requirement(parent.id).expect("get").expect("exists");
    assert_eq!(reloaded_parent.stage, "tasked");

    let tasks_for_beta = f.store.tasks_for_requirement_ids(&[created[1].id], None).expect("tasks");
    assert_eq!(tasks_for_beta.len(), 1);
    let alpha_task_id = f
        .store
        .tasks_for_requirement_ids(&[created[0].id], None)
        .expect("tasks")[0]
        .id;
    assert_eq!(tasks_for_beta[0].blocked_by, alpha_task_id.to_string());
}

#[test]
fn rollup_advances_parent_only_when_every_child_task_is_terminal() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");

    let parent = requirements::register(&f.store, "features/rollup-parent", "features", "requirement", None, "lead-1", "tasked")
        .expect("register parent");
    let task_file = f.seed_file("tasks/rollup.md", "# rollup task\n");
    let task = tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Rollup task",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "feature",
        Some(parent.id),
    )
    .expect("create task under requirement");

    let before = f.store.get_requirement(parent.id).expect("get").expect("exists");
    assert_eq!(before.stage, "tasked", "not terminal yet, gate should still fail");

    tasks::done(&f.store, f.work_dir.path(), "lead-1", task.id, None).expect("close the only child task");

    let after = f.store.get_requirement(parent.id).expect("get").expect("exists");
    assert_eq!(after.stage, "in_progress", "rollup should advance tasked -> in_progress");
}

#[test]
fn skip_walk_is_lead_only_and_halts_at_first_gate_failure() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");

    let req = requirements::register(&f.store, "features/skip-me", "features", "requirement", None, "lead-1", "seed")
        .expect("register");
    let task_file = f.seed_file("tasks/skip-me.md", "# still open\n");
    tasks::create(
        &f.store,
        f.work_dir.path(),
        "lead-1",
        "Still open",
        &task_file,
        None,
        None,
        "",
        None,
        "task",
        "feature",
        Some(req.id),
    )
    .expect("seed an unclosed child task so the tasked gate genuinely fails");

    let err = requirements::skip_walk(&f.store, f.work_dir.path(), "coder-1", req.id, "completed")
        .expect_err("coder is not the lead");
    assert!(matches!(err, EngineError::Blocked(_)));

    let outcome = requirements::skip_walk(&f.store, f.work_dir.path(), "lead-1", req.id, "completed")
        .expect("lead may attempt the shortcut");
    assert!(!outcome.hit_target, "tasked's all_impl_tasks_closed gate is blocked by the open task");
    assert_eq!(outcome.reached, "tasked");
}
