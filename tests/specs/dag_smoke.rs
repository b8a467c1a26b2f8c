//! End-to-end task DAG walk: open -> assigned -> in_progress -> fixed ->
//! verified -> closed, driven entirely through the CLI. Asserts the gate
//! on `fixed` actually blocks until a result is filed, and that the
//! `fixed`/`verified` handoffs actually change hands to a different-class
//! reviewer/tester rather than being walked by the original coder.

use crate::prelude::Project;

#[test]
fn task_walks_the_full_dag_to_closed() {
    let p = Project::new();
    p.register("lead-1", "lead");
    p.register("coder-1", "coder");
    p.register("oracle-1", "oracle");
    p.register("builder-1", "builder");
    p.set_plan("lead-1", "plans/sprint-1.md");

    let task_file = p.work_file("tasks/widget.md", "# Build the widget\n");
    let task = p.ok(&[
        "task",
        "create",
        "--creator",
        "lead-1",
        "--title",
        "Build the widget",
        "--task-file",
        &task_file,
    ]);
    let task_id = task["id"].as_i64().unwrap();
    assert_eq!(task["status"], "open");

    let pulled = p.ok(&["task", "pull", &task_id.to_string(), "--agent", "coder-1"]);
    assert_eq!(pulled["task"]["assigned_to"], "coder-1");
    assert_eq!(pulled["task"]["status"], "open", "the open stage hands off without flipping status");

    let advance_to_assigned = p.ok(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "coder-1",
    ]);
    assert_eq!(advance_to_assigned["to_stage"], "assigned");

    let advance_to_in_progress = p.ok(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "coder-1",
    ]);
    assert_eq!(advance_to_in_progress["to_stage"], "in_progress");

    // The `fixed` gate requires a filed result; entering it too early blocks.
    let blocked = p.err(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "coder-1",
    ]);
    assert!(blocked.contains("submit_result"), "expected gate failure, got: {blocked}");

    p.ok(&[
        "task",
        "result",
        &task_id.to_string(),
        "--triggered-by",
        "coder-1",
        "--content",
        "Widget built, see src/widget.rs",
    ]);

    let advance_to_fixed = p.ok(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "coder-1",
    ]);
    assert_eq!(advance_to_fixed["to_stage"], "fixed");
    assert_eq!(
        advance_to_fixed["task"]["assigned_to"], serde_json::Value::Null,
        "entering a stage with a `workers` list must null assigned_to so a different class can pull it"
    );

    // `fixed` hands off to {oracle, auditor} and nulled assigned_to, so the
    // reviewer (a different agent and class from the coder) can now pull it.
    let oracle_pull = p.ok(&["task", "pull", &task_id.to_string(), "--agent", "oracle-1"]);
    assert_eq!(oracle_pull["task"]["assigned_to"], "oracle-1");

    let advance_to_verified = p.ok(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "oracle-1",
    ]);
    assert_eq!(advance_to_verified["to_stage"], "verified");
    assert_eq!(advance_to_verified["task"]["assigned_to"], serde_json::Value::Null);

    // `verified` hands off to {builder, auditor}.
    let builder_pull = p.ok(&["task", "pull", &task_id.to_string(), "--agent", "builder-1"]);
    assert_eq!(builder_pull["task"]["assigned_to"], "builder-1");

    let advance_to_closed = p.ok(&[
        "task",
        "complete-phase",
        &task_id.to_string(),
        "--passed",
        "--triggered-by",
        "builder-1",
    ]);
    assert_eq!(advance_to_closed["to_stage"], "closed");
    assert_eq!(advance_to_closed["terminal"], true);

    let final_task = p.ok(&["task", "get", &task_id.to_string()]);
    assert_eq!(final_task["status"], "closed");

    let lineage = p.ok(&["task", "lineage", &task_id.to_string()]);
    let stages: Vec<&str> = lineage.as_array().unwrap().iter().map(|e| e["to_status"].as_str().unwrap()).collect();
    assert_eq!(stages, vec!["open", "assigned", "in_progress", "fixed", "verified", "closed"]);
}

#[test]
fn non_chore_task_requires_lead_and_active_battle_plan() {
    let p = Project::new();
    p.register("coder-1", "coder");
    let task_file = p.work_file("tasks/x.md", "# x\n");

    let rejected = p.err(&[
        "task",
        "create",
        "--creator",
        "coder-1",
        "--title",
        "x",
        "--task-file",
        &task_file,
    ]);
    assert!(rejected.contains("only the lead"), "got: {rejected}");

    p.register("lead-1", "lead");
    let no_plan = p.err(&[
        "task",
        "create",
        "--creator",
        "lead-1",
        "--title",
        "x",
        "--task-file",
        &task_file,
    ]);
    assert!(no_plan.contains("no active battle plan"), "got: {no_plan}");

    // A chore bypasses both preconditions.
    let chore = p.ok(&[
        "task",
        "create",
        "--creator",
        "coder-1",
        "--title",
        "tidy up",
        "--task-file",
        &task_file,
        "--task-type",
        "chore",
    ]);
    assert_eq!(chore["task_type"], "chore");
}
