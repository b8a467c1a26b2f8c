// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::monitoring::{self, Judgment};
use crate::test_support::fixture;

#[test]
fn check_activity_is_active_right_after_registration() {
    let f = fixture();
    let agent = f.register("coder-1", "coder");
    let judgment = monitoring::check_activity(&f.store, f.work_dir.path(), &agent).expect("check activity");
    assert_eq!(judgment, Judgment::Active);
}

#[test]
fn check_freshness_is_stale_with_no_recorded_context() {
    let f = fixture();
    let agent = f.register("coder-1", "coder");
    let report = monitoring::check_freshness(&agent);
    assert!(report.stale, "never-set context must read as stale");
    assert_eq!(report.threshold_secs, 300);
}

#[test]
fn check_freshness_is_fresh_immediately_after_touch() {
    let f = fixture();
    let agent = f.register_fresh("oracle-1", "oracle");
    let report = monitoring::check_freshness(&agent);
    assert!(!report.stale);
    assert_eq!(report.threshold_secs, 1800, "oracle gets the most generous threshold");
}

#[test]
fn party_status_covers_every_registered_agent() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    let statuses = monitoring::party_status(&f.store, f.work_dir.path()).expect("party status");
    assert_eq!(statuses.len(), 2);
}

#[test]
fn sitrep_fuses_flags_plans_and_active_tasks() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");
    let task_file = f.seed_file("tasks/widget.md", "# widget\n");
    crate::tasks::create(
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
    .expect("create task");

    let sitrep = monitoring::sitrep(&f.store, f.work_dir.path(), 10).expect("sitrep");
    assert_eq!(sitrep.agents.len(), 1);
    assert_eq!(sitrep.active_tasks.len(), 1);
    assert!(sitrep.battle_plan.is_some());
    assert!(!sitrep.moon_crash);
    assert!(!sitrep.stand_down);
}
