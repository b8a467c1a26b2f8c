// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::backlog;
use crate::test_support::fixture;
use crate::EngineError;

#[test]
fn add_rejects_duplicate_path() {
    let f = fixture();
    backlog::add(&f.store, "backlog/bugs/crash/README.md", "bug", "Crash on boot", "high", None)
        .expect("first add");
    let err = backlog::add(&f.store, "backlog/bugs/crash/README.md", "bug", "Crash on boot", "high", None)
        .expect_err("duplicate");
    assert!(matches!(err, EngineError::Invalid(_)));
}

#[test]
fn update_changes_title_and_priority() {
    let f = fixture();
    backlog::add(&f.store, "backlog/ideas/dark-mode/README.md", "idea", "Dark mode", "low", None).expect("add");
    backlog::update(&f.store, "backlog/ideas/dark-mode/README.md", None, Some("urgent")).expect("update priority");
    let item = backlog::show(&f.store, "backlog/ideas/dark-mode/README.md").expect("show");
    assert_eq!(item.priority, "urgent");
    assert_eq!(item.title, "Dark mode");
}

#[test]
fn kill_defer_and_reopen_cycle_the_status() {
    let f = fixture();
    backlog::add(&f.store, "backlog/smells/dup-code/README.md", "smell", "Duplicated helpers", "medium", None)
        .expect("add");

    backlog::kill(&f.store, "backlog/smells/dup-code/README.md").expect("kill");
    assert_eq!(backlog::show(&f.store, "backlog/smells/dup-code/README.md").expect("show").status, "killed");

    backlog::reopen(&f.store, "backlog/smells/dup-code/README.md").expect("reopen");
    assert_eq!(backlog::show(&f.store, "backlog/smells/dup-code/README.md").expect("show").status, "open");

    backlog::defer(&f.store, "backlog/smells/dup-code/README.md").expect("defer");
    assert_eq!(backlog::show(&f.store, "backlog/smells/dup-code/README.md").expect("show").status, "deferred");
}

#[test]
fn reindex_walks_every_known_category_and_is_idempotent() {
    let f = fixture();
    f.seed_file("backlog/bugs/login-crash/README.md", "# Login crash\n\nIt crashes.\n");
    f.seed_file("backlog/ideas/offline-mode/README.md", "# Offline mode\n");
    let root = f.work_dir.path().join("backlog");

    let first = backlog::reindex(&f.store, &root, Some("lead-1")).expect("first reindex");
    assert_eq!(first.registered.len(), 2);

    let second = backlog::reindex(&f.store, &root, Some("lead-1")).expect("second reindex");
    assert!(second.registered.is_empty());
    assert_eq!(second.skipped.len(), 2);

    let bug = backlog::show(&f.store, "bugs/login-crash/README.md").expect("show");
    assert_eq!(bug.title, "Login crash");
}

#[test]
fn list_reflects_every_added_item() {
    let f = fixture();
    backlog::add(&f.store, "backlog/requests/api-key/README.md", "request", "API key rotation", "medium", None)
        .expect("add");
    backlog::add(&f.store, "backlog/debt/flaky-test/README.md", "debt", "Flaky integration test", "low", None)
        .expect("add");
    let items = backlog::list(&f.store).expect("list");
    assert_eq!(items.len(), 2);
}
