//! Inbox discipline and staleness gating on `send`: a sender with unread
//! mail, or no recorded context, is blocked outright.

use crate::prelude::Project;

#[test]
fn send_requires_context_and_clean_inbox() {
    let p = Project::new();
    p.register("lead-1", "lead");
    p.register("coder-1", "coder");
    p.set_plan("lead-1", "plans/sprint-1.md");

    // No context recorded yet.
    let blocked = p.err(&["send", "--from", "lead-1", "--to", "coder-1", "--message", "hello"]);
    assert!(blocked.contains("no recorded context"), "got: {blocked}");

    p.ok(&["set-context", "--agent", "lead-1", "--summary", "starting up"]);
    p.ok(&["set-context", "--agent", "coder-1", "--summary", "starting up"]);

    let sent = p.ok(&["send", "--from", "lead-1", "--to", "coder-1", "--message", "welcome aboard"]);
    assert_eq!(sent["message"]["from"], "lead-1");
    assert_eq!(sent["message"]["to"], "coder-1");

    // lead-1 has an outstanding unread broadcast/direct? No — but coder-1 now has unread mail.
    let inbox_blocked = p.err(&["send", "--from", "coder-1", "--to", "lead-1", "--message", "reply"]);
    assert!(inbox_blocked.contains("unread"), "got: {inbox_blocked}");

    let inbox = p.ok(&["check-inbox", "--agent", "coder-1"]);
    assert!(inbox["direct"].as_array().map(|a| !a.is_empty()).unwrap_or(false));

    let reply = p.ok(&["send", "--from", "coder-1", "--to", "lead-1", "--message", "reply"]);
    assert_eq!(reply["message"]["to"], "lead-1");

    let history = p.ok(&["list-history", "--agent", "lead-1"]);
    assert!(history.as_array().unwrap().len() >= 2);
}

#[test]
fn rename_moves_an_agent_to_a_new_name() {
    let p = Project::new();
    p.register("coder-1", "coder");
    let renamed = p.ok(&["rename", "--old", "coder-1", "--new", "coder-2"]);
    assert_eq!(renamed["name"], "coder-2");

    let missing = p.err(&["rename", "--old", "coder-1", "--new", "coder-3"]);
    assert!(missing.contains("not registered") || missing.contains("BLOCKED"), "got: {missing}");
}
