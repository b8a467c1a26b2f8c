// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::poll::{self, ExitCode};
use crate::test_support::fixture;
use crate::{comms, tasks};

#[test]
fn poll_terminates_immediately_on_stand_down() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    f.store
        .set_flag(minion_store::FLAG_STAND_DOWN, "now", "lead-1")
        .expect("set stand_down");

    let result = poll::poll(&f.store, f.work_dir.path(), "coder-1", 1, 0).expect("poll");
    assert_eq!(result.exit_code, ExitCode::Terminate);
    assert_eq!(result.signal.as_deref(), Some(minion_store::FLAG_STAND_DOWN));
}

#[test]
fn poll_returns_content_immediately_when_mail_is_waiting() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");
    comms::send(&f.store, f.work_dir.path(), "lead-1", "coder-1", "go", "").expect("send");

    let result = poll::poll(&f.store, f.work_dir.path(), "coder-1", 1, 5).expect("poll");
    assert_eq!(result.exit_code, ExitCode::Content);
    assert!(result.messages.is_some());
}

#[test]
fn poll_times_out_when_nothing_is_claimable() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    let result = poll::poll(&f.store, f.work_dir.path(), "coder-1", 1, 1).expect("poll");
    assert_eq!(result.exit_code, ExitCode::Timeout);
}

#[test]
fn has_claimable_work_sees_an_open_task_matching_the_agents_class() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
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
        Some("coder"),
        "task",
        "feature",
        None,
    )
    .expect("create");

    assert!(poll::has_claimable_work(&f.store, "coder-1").expect("has work"));
}

#[test]
fn has_claimable_work_is_false_during_a_moon_crash() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
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
        Some("coder"),
        "task",
        "feature",
        None,
    )
    .expect("create");
    f.store
        .set_flag(minion_store::FLAG_MOON_CRASH, "now", "lead-1")
        .expect("set moon_crash");

    assert!(!poll::has_claimable_work(&f.store, "coder-1").expect("has work"));
}
