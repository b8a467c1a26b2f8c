//! Polling protocol terminate signal and HP accounting across a phoenix
//! respawn.

use crate::prelude::Project;

#[test]
fn poll_exits_terminate_on_stand_down() {
    let p = Project::new();
    p.register("coder-1", "coder");
    p.ok(&["stand-down"]);

    let (code, result) = p.exit_code(&["poll", "--agent", "coder-1", "--timeout", "1"]);
    assert_eq!(code, 3, "ExitCode::Terminate is 3");
    assert_eq!(result["signal"], "stand_down");
}

#[test]
fn poll_times_out_with_no_work() {
    let p = Project::new();
    p.register("coder-1", "coder");

    let (code, result) = p.exit_code(&["poll", "--agent", "coder-1", "--interval", "1", "--timeout", "1"]);
    assert_eq!(code, 1, "ExitCode::Timeout is 1");
    assert!(result["tasks"].as_array().unwrap().is_empty());
}

#[test]
fn hp_depletes_with_token_usage_and_self_report_overrides_it() {
    let p = Project::new();
    p.register("coder-1", "coder");

    let outcome = p.ok(&[
        "update-hp",
        "--agent",
        "coder-1",
        "--input-tokens",
        "50000",
        "--output-tokens",
        "10000",
        "--limit",
        "200000",
    ]);
    assert!(outcome["summary"]["pct"].as_i64().unwrap() < 100);
    assert_eq!(outcome["self_reported_noop"], false);

    let summary = p.ok(&["hp-summary", "--agent", "coder-1"]);
    assert!(summary["pct"].as_i64().unwrap() < 100);

    // Self-reported HP is the sentinel: subsequent update-hp calls no-op.
    p.ok(&["set-context", "--agent", "coder-1", "--hp", "100"]);
    let after_self_report = p.ok(&[
        "update-hp",
        "--agent",
        "coder-1",
        "--input-tokens",
        "90000",
        "--output-tokens",
        "5000",
        "--limit",
        "200000",
    ]);
    assert_eq!(after_self_report["self_reported_noop"], true);
}
