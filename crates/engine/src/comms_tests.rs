// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::test_support::fixture;
use crate::{comms, EngineError};

#[test]
fn send_blocked_while_unread_mail_is_pending() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");

    comms::send(&f.store, f.work_dir.path(), "lead-1", "coder-1", "heads up", "").expect("lead sends");

    let err = comms::send(&f.store, f.work_dir.path(), "coder-1", "lead-1", "reply", "")
        .expect_err("coder still has unread mail");
    assert!(err.to_string().contains("unread"));

    comms::check_inbox(&f.store, f.work_dir.path(), "coder-1").expect("drain inbox");
    comms::send(&f.store, f.work_dir.path(), "coder-1", "lead-1", "reply", "").expect("now it clears");
}

#[test]
fn send_blocked_without_active_battle_plan() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");

    let err = comms::send(&f.store, f.work_dir.path(), "lead-1", "coder-1", "hi", "")
        .expect_err("no plan set yet");
    assert!(err.to_string().contains("battle plan"));
}

#[test]
fn send_blocked_when_context_is_stale() {
    let f = fixture();
    f.register("lead-1", "lead"); // no touch_context_updated: context_updated_at stays NULL
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");

    let err = comms::send(&f.store, f.work_dir.path(), "lead-1", "coder-1", "hi", "")
        .expect_err("lead has no recorded context");
    assert!(matches!(err, EngineError::Blocked(_)));
}

#[test]
fn send_from_unregistered_agent_auto_registers_and_is_exempt_from_staleness() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");

    // "helper-1" was never registered, so it has no context to be stale;
    // its first send must not be rejected for having "no recorded context".
    let outcome = comms::send(&f.store, f.work_dir.path(), "helper-1", "lead-1", "ad-hoc ping", "")
        .expect("unregistered sender is exempt from staleness on its first send");
    assert_eq!(outcome.message.to_agent, "lead-1");

    let agent = f.store.get_agent("helper-1").expect("lookup").expect("auto-registered");
    assert_eq!(agent.class, "coder");
}

#[test]
fn send_auto_ccs_the_lead() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.register_fresh("coder-2", "coder");
    f.set_plan("lead-1");

    let outcome = comms::send(&f.store, f.work_dir.path(), "coder-1", "coder-2", "status update", "")
        .expect("send between non-lead peers");
    assert_eq!(outcome.cc.len(), 1);
    assert_eq!(outcome.cc[0].to_agent, "lead-1");
    assert!(outcome.cc[0].is_cc);
}

#[test]
fn send_scans_trigger_words_and_sets_flags() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.set_plan("lead-1");

    comms::send(&f.store, f.work_dir.path(), "lead-1", "all", "calling a stand_down now", "")
        .expect("broadcast with trigger word");
    assert!(f.store.flag_is_set(minion_store::FLAG_STAND_DOWN).expect("flag read"));
}

#[test]
fn check_inbox_consumes_direct_and_broadcast_separately_per_recipient() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.register_fresh("coder-2", "coder");
    f.set_plan("lead-1");

    comms::send(&f.store, f.work_dir.path(), "lead-1", "broadcast", "party-wide note", "").expect("broadcast");

    let first = comms::check_inbox(&f.store, f.work_dir.path(), "coder-1").expect("coder-1 reads");
    assert_eq!(first.broadcasts.len(), 1);
    let second = comms::check_inbox(&f.store, f.work_dir.path(), "coder-2").expect("coder-2 reads independently");
    assert_eq!(second.broadcasts.len(), 1);

    let third = comms::check_inbox(&f.store, f.work_dir.path(), "coder-1").expect("coder-1 re-reads");
    assert!(third.broadcasts.is_empty(), "already consumed by this recipient");
}

#[test]
fn purge_deletes_old_direct_and_marks_broadcasts_read() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");
    f.set_plan("lead-1");
    comms::send(&f.store, f.work_dir.path(), "lead-1", "coder-1", "old news", "").expect("send");
    comms::check_inbox(&f.store, f.work_dir.path(), "coder-1").expect("drain");

    let outcome = comms::purge(&f.store, "coder-1", 0).expect("purge everything older than 0h");
    assert_eq!(outcome.direct_deleted, 1);
}

#[test]
fn rename_rejects_collision_with_existing_agent() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    f.register_fresh("coder-2", "coder");

    let err = comms::rename(&f.store, "coder-1", "coder-2").expect_err("coder-2 already exists");
    assert!(matches!(err, EngineError::Invalid(_)));
}

#[test]
fn register_rejects_model_outside_the_class_whitelist() {
    let f = fixture();
    let err = comms::register(
        &f.store,
        f.work_dir.path(),
        "coder-1",
        "coder",
        Some("opus"),
        None,
        "terminal",
        None,
    )
    .expect_err("opus is not in coder's model whitelist");
    assert!(matches!(err, EngineError::Invalid(_)));

    comms::register(
        &f.store,
        f.work_dir.path(),
        "coder-1",
        "coder",
        Some("haiku"),
        None,
        "terminal",
        None,
    )
    .expect("haiku is allowed for coder");
}
