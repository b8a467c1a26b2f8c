// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::hp::{self, Health};
use crate::test_support::fixture;

#[test]
fn update_hp_is_a_noop_when_the_agent_self_reports() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    f.store.update_agent_hp("coder-1", 0, 0, 100, 42, 0).expect("seed self-report");

    let outcome = hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 1000, 1000, 200_000, 0, 0)
        .expect("update attempt");
    assert!(outcome.self_reported_noop);
    assert!(outcome.summary.is_none());

    let agent = f.store.get_agent("coder-1").expect("get").expect("exists");
    assert_eq!(agent.hp_tokens_limit, 100, "self-reported row must not be overwritten");
}

#[test]
fn hp_summary_renders_the_self_report_sentinel_directly() {
    let f = fixture();
    f.register_fresh("coder-1", "coder");
    f.store.update_agent_hp("coder-1", 0, 0, 100, 30, 0).expect("self report 30% used");

    let agent = f.store.get_agent("coder-1").expect("get").expect("exists");
    let summary = hp::hp_summary(&agent);
    assert_eq!(summary.pct, 70);
    assert_eq!(summary.limit_k, 100);
}

#[test]
fn hp_summary_defaults_to_full_health_when_no_limit_is_set() {
    let f = fixture();
    let agent = f.register("coder-1", "coder");
    let summary = hp::hp_summary(&agent);
    assert_eq!(summary.pct, 100);
    assert_eq!(summary.health, Health::Healthy);
}

#[test]
fn update_hp_fires_threshold_alerts_and_rearms_above_fifty() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");

    // 80k/100k used -> 20% left, crosses the 25% threshold.
    let first = hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 0, 0, 100_000, 80_000, 0)
        .expect("first update");
    assert!(!first.self_reported_noop);
    assert_eq!(first.alerts_fired, vec![25]);

    // 92k/100k used -> 8% left, crosses the 10% threshold too.
    let second = hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 0, 0, 100_000, 92_000, 0)
        .expect("second update");
    assert_eq!(second.alerts_fired, vec![10]);

    // Recovering above 50% clears the fired set so a later dip re-fires.
    let recovered = hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 0, 0, 100_000, 10_000, 0)
        .expect("recovery update");
    assert!(recovered.alerts_fired.is_empty());

    let redip = hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 0, 0, 100_000, 80_000, 0)
        .expect("re-dip update");
    assert_eq!(redip.alerts_fired, vec![25], "threshold must re-arm after recovery above 50%");
}

#[test]
fn update_hp_threshold_alert_notifies_the_lead() {
    let f = fixture();
    f.register_fresh("lead-1", "lead");
    f.register_fresh("coder-1", "coder");

    hp::update_hp(&f.store, f.work_dir.path(), "coder-1", 0, 0, 100_000, 95_000, 0).expect("update past 10%");

    let inbox = f.store.unread_direct_count("lead-1").expect("unread count");
    assert!(inbox >= 1, "the lead should have received an HP threshold alert");
}

#[test]
fn is_phoenix_down_cutoff_is_inclusive_of_five_percent() {
    assert!(hp::is_phoenix_down(5));
    assert!(hp::is_phoenix_down(0));
    assert!(!hp::is_phoenix_down(6));
}
