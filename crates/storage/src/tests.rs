// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::agents::RegisterInput;
use crate::backlog::NewBacklogItem;
use crate::claims::ClaimOutcome;
use crate::messages::NewMessage;
use crate::requirements::NewRequirement;
use crate::store::Store;
use crate::tasks::{NewTask, PullOutcome};
use tempfile::tempdir;

fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path().join("minion.db")).expect("open store");
    (dir, store)
}

#[test]
fn register_is_idempotent_and_preserves_model() {
    let (_dir, store) = open_store();
    store
        .register_agent(RegisterInput {
            name: "coder-1",
            class: "coder",
            model: Some("sonnet"),
            description: Some("a coder"),
            transport: "daemon",
            crew: None,
        })
        .expect("register");

    let again = store
        .register_agent(RegisterInput {
            name: "coder-1",
            class: "coder",
            model: None,
            description: None,
            transport: "daemon",
            crew: None,
        })
        .expect("re-register");

    assert_eq!(again.model.as_deref(), Some("sonnet"));
    assert_eq!(again.description.as_deref(), Some("a coder"));
    assert_eq!(store.list_agents().expect("list").len(), 1);
}

#[test]
fn battle_plan_single_active_invariant() {
    let (_dir, store) = open_store();
    let first = store.set_battle_plan("lead-1", "plans/a.md").expect("first");
    let second = store.set_battle_plan("lead-1", "plans/b.md").expect("second");

    let active = store.active_battle_plan().expect("active").expect("some");
    assert_eq!(active.id, second.id);

    let refreshed_first = store
        .get_agent("lead-1")
        .expect("no agent row needed")
        .is_none();
    assert!(refreshed_first);

    // The original row was demoted, not deleted.
    let conn = store.connect().expect("connect");
    let status: String = conn
        .query_row("SELECT status FROM battle_plans WHERE id = ?1", [first.id], |r| r.get(0))
        .expect("status");
    assert_eq!(status, "superseded");
}

#[test]
fn file_claims_are_exclusive_with_fifo_waitlist() {
    let (_dir, store) = open_store();
    match store.claim_file("src/main.rs", "coder-1").expect("claim") {
        ClaimOutcome::Granted(_) => {}
        _ => panic!("expected grant"),
    }
    match store.claim_file("src/main.rs", "coder-2").expect("claim") {
        ClaimOutcome::Waitlisted(claim) => assert_eq!(claim.agent, "coder-1"),
        _ => panic!("expected waitlist"),
    }
    let waiter = store.release_file("src/main.rs", "coder-1").expect("release");
    assert_eq!(waiter.expect("waiter").agent, "coder-2");
    assert!(store.get_claim("src/main.rs").expect("get").is_none());
}

#[test]
fn pull_task_race_is_single_winner() {
    let (_dir, store) = open_store();
    let task = store
        .create_task(NewTask {
            title: "fix bug",
            task_file: "tasks/1.md",
            project: None,
            zone: None,
            blocked_by: "",
            created_by: "lead-1",
            class_required: Some("coder"),
            flow_type: "task",
            task_type: "feature",
            requirement_id: None,
        })
        .expect("create");

    let first = store.pull_task(task.id, "coder-1", false).expect("pull");
    assert!(matches!(first, PullOutcome::Claimed(_)));
    let second = store.pull_task(task.id, "coder-2", false).expect("pull");
    assert!(matches!(second, PullOutcome::RaceLost));
}

#[test]
fn unread_counts_span_direct_and_broadcast() {
    let (_dir, store) = open_store();
    store
        .insert_message(NewMessage {
            from_agent: "lead-1",
            to_agent: "coder-1",
            content_file: "inbox/coder-1/1.md",
            is_cc: false,
            cc_original_to: None,
        })
        .expect("direct");
    store
        .insert_message(NewMessage {
            from_agent: "lead-1",
            to_agent: "all",
            content_file: "inbox/all/1.md",
            is_cc: false,
            cc_original_to: None,
        })
        .expect("broadcast");

    assert_eq!(store.unread_direct_count("coder-1").expect("count"), 1);
    assert_eq!(store.unread_broadcast_count("coder-1").expect("count"), 1);
}

#[test]
fn descendant_ids_match_path_prefix_not_substring() {
    let (_dir, store) = open_store();
    let parent = store
        .register_requirement(NewRequirement {
            file_path: "features/login",
            origin: "features",
            flow_type: "requirement",
            parent_id: None,
            created_by: "lead-1",
            stage: "seed",
        })
        .expect("parent");
    let child = store
        .register_requirement(NewRequirement {
            file_path: "features/login/001-oauth",
            origin: "features",
            flow_type: "requirement",
            parent_id: Some(parent.id),
            created_by: "lead-1",
            stage: "seed",
        })
        .expect("child");
    let _unrelated = store
        .register_requirement(NewRequirement {
            file_path: "features/login-legacy",
            origin: "features",
            flow_type: "requirement",
            parent_id: None,
            created_by: "lead-1",
            stage: "seed",
        })
        .expect("unrelated");

    let ids = store.descendant_ids(&parent).expect("descendants");
    assert!(ids.contains(&parent.id));
    assert!(ids.contains(&child.id));
    assert_eq!(ids.len(), 2);
}

#[test]
fn backlog_promote_marks_status() {
    let (_dir, store) = open_store();
    let item = store
        .add_backlog_item(NewBacklogItem {
            file_path: "backlog/bugs/login-crash",
            item_type: "bug",
            title: "Login Crash",
            priority: "high",
            source: None,
        })
        .expect("add");
    store
        .set_backlog_status(&item.file_path, "promoted", Some("bugs/login-crash"))
        .expect("promote");
    let after = store.get_backlog_item(&item.file_path).expect("get").expect("present");
    assert_eq!(after.status, "promoted");
    assert_eq!(after.promoted_to.as_deref(), Some("bugs/login-crash"));
}

#[test]
fn transition_log_is_append_only_across_tasks_and_requirements() {
    let (_dir, store) = open_store();
    let task = store
        .create_task(NewTask {
            title: "t",
            task_file: "tasks/1.md",
            project: None,
            zone: None,
            blocked_by: "",
            created_by: "lead-1",
            class_required: None,
            flow_type: "task",
            task_type: "chore",
            requirement_id: None,
        })
        .expect("create");
    let log = store.transition_log_for("task", task.id).expect("log");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].to_status, "open");
    assert!(log[0].from_status.is_none());
}
