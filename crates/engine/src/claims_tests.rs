// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::claims;
use crate::test_support::fixture;
use minion_store::ClaimOutcome;

#[test]
fn claim_is_granted_then_idempotent_for_the_same_agent() {
    let f = fixture();
    let first = claims::claim_file(&f.store, "src/main.rs", "coder-1").expect("first claim");
    assert!(matches!(first, ClaimOutcome::Granted(_)));

    let second = claims::claim_file(&f.store, "src/main.rs", "coder-1").expect("re-claim");
    assert!(matches!(second, ClaimOutcome::AlreadyOurs(_)));
}

#[test]
fn claim_held_by_another_agent_waitlists_the_caller() {
    let f = fixture();
    claims::claim_file(&f.store, "src/main.rs", "coder-1").expect("first claim");
    let outcome = claims::claim_file(&f.store, "src/main.rs", "coder-2").expect("second claim");
    assert!(matches!(outcome, ClaimOutcome::Waitlisted(_)));
}

#[test]
fn release_surfaces_but_does_not_auto_promote_the_next_waiter() {
    let f = fixture();
    claims::claim_file(&f.store, "src/main.rs", "coder-1").expect("first claim");
    claims::claim_file(&f.store, "src/main.rs", "coder-2").expect("waitlisted");

    let waiter = claims::release_file(&f.store, "src/main.rs", "coder-1").expect("release");
    assert_eq!(waiter.expect("coder-2 waiting").agent, "coder-2");

    let claimed_by: Vec<_> = claims::list_claims(&f.store)
        .expect("list")
        .into_iter()
        .filter(|c| c.file_path == "src/main.rs")
        .collect();
    assert!(claimed_by.is_empty(), "release must not auto-promote the waitlist");
}

#[test]
fn release_all_for_agent_frees_every_held_file() {
    let f = fixture();
    claims::claim_file(&f.store, "src/a.rs", "coder-1").expect("claim a");
    claims::claim_file(&f.store, "src/b.rs", "coder-1").expect("claim b");

    claims::release_all_for_agent(&f.store, "coder-1").expect("release all");
    let remaining = claims::list_claims(&f.store).expect("list");
    assert!(remaining.is_empty());
}
