//! Multi-agent task dependency: a task blocked by another cannot be pulled
//! until the blocker closes.

use crate::prelude::Project;

#[test]
fn blocked_task_cannot_be_pulled_until_blocker_closes() {
    let p = Project::new();
    p.register("lead-1", "lead");
    p.register("coder-1", "coder");
    p.register("coder-2", "coder");
    p.set_plan("lead-1", "plans/sprint-1.md");

    let t1_file = p.work_file("tasks/t1.md", "# T1\n");
    let t1 = p.ok(&["task", "create", "--creator", "lead-1", "--title", "T1", "--task-file", &t1_file]);
    let t1_id = t1["id"].as_i64().unwrap();

    let t2_file = p.work_file("tasks/t2.md", "# T2\n");
    let t2 = p.ok(&[
        "task",
        "create",
        "--creator",
        "lead-1",
        "--title",
        "T2",
        "--task-file",
        &t2_file,
        "--blocked-by",
        &t1_id.to_string(),
    ]);
    let t2_id = t2["id"].as_i64().unwrap();

    let blocked = p.err(&["task", "pull", &t2_id.to_string(), "--agent", "coder-2"]);
    assert!(blocked.contains("unresolved blocker"), "got: {blocked}");

    p.ok(&["task", "pull", &t1_id.to_string(), "--agent", "coder-1"]);
    p.ok(&["task", "done", &t1_id.to_string(), "--lead", "lead-1"]);

    let pulled = p.ok(&["task", "pull", &t2_id.to_string(), "--agent", "coder-2"]);
    assert_eq!(pulled["task"]["assigned_to"], "coder-2");
    p.ok(&["task", "done", &t2_id.to_string(), "--lead", "lead-1"]);

    let final_t1 = p.ok(&["task", "get", &t1_id.to_string()]);
    let final_t2 = p.ok(&["task", "get", &t2_id.to_string()]);
    assert_eq!(final_t1["status"], "closed");
    assert_eq!(final_t2["status"], "closed");

    let lineage_t1 = p.ok(&["task", "lineage", &t1_id.to_string()]);
    let lineage_t2 = p.ok(&["task", "lineage", &t2_id.to_string()]);
    assert!(lineage_t1.as_array().unwrap().len() >= 2);
    assert!(lineage_t2.as_array().unwrap().len() >= 2);
}
