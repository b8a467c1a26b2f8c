// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task rows and the append-only transition log shared with requirements
//! (`entity_type` discriminates `"task"` vs `"requirement"`).

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub task_file: String,
    pub project: Option<String>,
    pub zone: Option<String>,
    pub status: String,
    pub blocked_by: String,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub files: String,
    pub progress: Option<String>,
    pub class_required: Option<String>,
    pub flow_type: String,
    pub task_type: String,
    pub activity_count: i64,
    pub result_file: Option<String>,
    pub requirement_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn blocked_by_ids(&self) -> Vec<i64> {
        self.blocked_by
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect()
    }
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        task_file: row.get("task_file")?,
        project: row.get("project")?,
        zone: row.get("zone")?,
        status: row.get("status")?,
        blocked_by: row.get("blocked_by")?,
        assigned_to: row.get("assigned_to")?,
        created_by: row.get("created_by")?,
        files: row.get("files")?,
        progress: row.get("progress")?,
        class_required: row.get("class_required")?,
        flow_type: row.get("flow_type")?,
        task_type: row.get("task_type")?,
        activity_count: row.get("activity_count")?,
        result_file: row.get("result_file")?,
        requirement_id: row.get("requirement_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLogEntry {
    pub id: i64,
    pub entity_id: i64,
    pub entity_type: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub triggered_by: String,
    pub created_at: String,
}

fn row_to_transition(row: &Row) -> rusqlite::Result<TransitionLogEntry> {
    Ok(TransitionLogEntry {
        id: row.get("id")?,
        entity_id: row.get("entity_id")?,
        entity_type: row.get("entity_type")?,
        from_status: row.get("from_status")?,
        to_status: row.get("to_status")?,
        triggered_by: row.get("triggered_by")?,
        created_at: row.get("created_at")?,
    })
}

pub struct NewTask<'a> {
    pub title: &'a str,
    pub task_file: &'a str,
    pub project: Option<&'a str>,
    pub zone: Option<&'a str>,
    pub blocked_by: &'a str,
    pub created_by: &'a str,
    pub class_required: Option<&'a str>,
    pub flow_type: &'a str,
    pub task_type: &'a str,
    pub requirement_id: Option<i64>,
}

pub enum PullOutcome {
    Claimed(Task),
    RaceLost,
}

impl Store {
    pub fn create_task(&self, input: NewTask<'_>) -> StoreResult<Task> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        tx.execute(
            "INSERT INTO tasks (
                title, task_file, project, zone, status, blocked_by, created_by,
                class_required, flow_type, task_type, requirement_id, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                input.title,
                input.task_file,
                input.project,
                input.zone,
                input.blocked_by,
                input.created_by,
                input.class_required,
                input.flow_type,
                input.task_type,
                input.requirement_id,
                now,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
             VALUES (?1, 'task', NULL, 'open', ?2, ?3)",
            params![id, input.created_by, now],
        )?;
        let task = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        tx.commit()?;
        Ok(task)
    }

    pub fn get_task(&self, id: i64) -> StoreResult<Option<Task>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)
            .optional()
            .map_err(Into::into)
    }

    pub fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM tasks ORDER BY id")?;
        let rows = stmt.query_map([], row_to_task)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn tasks_for_requirement_ids(&self, ids: &[i64], flow_type: Option<&str>) -> StoreResult<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.connect()?;
        let placeholders: Vec<String> = ids.iter().map(|_| "?".to_string()).collect();
        let mut sql = format!(
            "SELECT * FROM tasks WHERE requirement_id IN ({})",
            placeholders.join(",")
        );
        if flow_type.is_some() {
            sql.push_str(" AND flow_type = ?");
        }
        let mut stmt = conn.prepare(&sql)?;
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            ids.iter().map(|i| Box::new(*i) as Box<dyn rusqlite::ToSql>).collect();
        if let Some(ft) = flow_type {
            params.push(Box::new(ft.to_string()));
        }
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_task)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn tasks_assigned_to(&self, agent: &str) -> StoreResult<Vec<Task>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM tasks WHERE assigned_to = ?1")?;
        let rows = stmt.query_map([agent], row_to_task)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn open_tasks_for_class(&self, class: &str) -> StoreResult<Vec<Task>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM tasks WHERE status = 'open' AND assigned_to IS NULL AND class_required = ?1",
        )?;
        let rows = stmt.query_map([class], row_to_task)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn tasks_at_statuses(&self, statuses: &[&str]) -> StoreResult<Vec<Task>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.connect()?;
        let placeholders: Vec<String> = statuses.iter().map(|_| "?".to_string()).collect();
        let sql = format!("SELECT * FROM tasks WHERE status IN ({})", placeholders.join(","));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(statuses.iter()), row_to_task)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn assign_task(&self, id: i64, agent: &str, new_status: Option<&str>) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        if let Some(status) = new_status {
            let from: Option<String> = tx.query_row("SELECT status FROM tasks WHERE id = ?1", [id], |r| r.get(0)).optional()?;
            tx.execute(
                "UPDATE tasks SET assigned_to = ?2, status = ?3, activity_count = activity_count + 1, updated_at = ?4 WHERE id = ?1",
                params![id, agent, status, now],
            )?;
            tx.execute(
                "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
                 VALUES (?1, 'task', ?2, ?3, ?4, ?5)",
                params![id, from, status, agent, now],
            )?;
        } else {
            tx.execute(
                "UPDATE tasks SET assigned_to = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, agent, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Race-safe claim. `reviewer_handoff` accepts unclaimed-or-ours without
    /// a status guard; otherwise the usual
    /// `(assigned&mine) OR (open&unassigned)` guard applies.
    pub fn pull_task(&self, id: i64, agent: &str, reviewer_handoff: bool) -> StoreResult<PullOutcome> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        let affected = if reviewer_handoff {
            conn.execute(
                "UPDATE tasks SET assigned_to = ?2, activity_count = activity_count + 1, updated_at = ?3
                 WHERE id = ?1 AND (assigned_to IS NULL OR assigned_to = ?2)",
                params![id, agent, now],
            )?
        } else {
            conn.execute(
                "UPDATE tasks SET assigned_to = ?2, status = 'assigned', activity_count = activity_count + 1, updated_at = ?3
                 WHERE id = ?1 AND (
                    (status = 'assigned' AND assigned_to = ?2) OR
                    (status = 'open' AND assigned_to IS NULL)
                 )",
                params![id, agent, now],
            )?
        };
        if affected == 0 {
            tracing::debug!(task_id = id, agent, "pull lost the claim race");
            return Ok(PullOutcome::RaceLost);
        }
        let task = conn
            .query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        Ok(PullOutcome::Claimed(task))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_task(
        &self,
        id: i64,
        status: Option<&str>,
        progress: Option<&str>,
        result_file: Option<&str>,
        files: Option<&str>,
        triggered_by: &str,
        bump_activity: bool,
    ) -> StoreResult<Task> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        let before = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;

        let next_status = status.unwrap_or(&before.status).to_string();
        let next_progress = progress.map(str::to_string).or(before.progress.clone());
        let next_result = result_file.map(str::to_string).or(before.result_file.clone());
        let next_files = files.unwrap_or(&before.files).to_string();
        let activity_delta = if bump_activity { 1 } else { 0 };

        tx.execute(
            "UPDATE tasks SET status = ?2, progress = ?3, result_file = ?4, files = ?5,
                activity_count = activity_count + ?6, updated_at = ?7 WHERE id = ?1",
            params![id, next_status, next_progress, next_result, next_files, activity_delta, now],
        )?;
        if status.is_some() && status != Some(before.status.as_str()) {
            tx.execute(
                "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
                 VALUES (?1, 'task', ?2, ?3, ?4, ?5)",
                params![id, before.status, next_status, triggered_by, now],
            )?;
        }
        let after = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        tx.commit()?;
        Ok(after)
    }

    /// Rewrites `blocked_by` after creation, for decompose's two-pass
    /// sibling-index wiring (children can block each other before any of
    /// them have ids).
    pub fn set_task_blocked_by(&self, id: i64, blocked_by: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE tasks SET blocked_by = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, blocked_by, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn clear_assignment(&self, id: i64) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE tasks SET assigned_to = NULL, updated_at = ?2 WHERE id = ?1",
            params![id, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn close_task(&self, id: i64, status: &str, triggered_by: &str) -> StoreResult<Task> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        let before = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        tx.execute(
            "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, now],
        )?;
        tx.execute(
            "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
             VALUES (?1, 'task', ?2, ?3, ?4, ?5)",
            params![id, before.status, status, triggered_by, now],
        )?;
        let after = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        tx.commit()?;
        Ok(after)
    }

    pub fn reopen_task(&self, id: i64, to_status: &str, triggered_by: &str) -> StoreResult<Task> {
        self.close_task(id, to_status, triggered_by)
    }

    /// Lead-only fast close used by `task done`: stamps `status=closed`
    /// directly with a `NULL -> closed` transition log entry, bypassing the
    /// DAG's own bookkeeping of the task's actual prior stage.
    pub fn force_close(&self, id: i64, triggered_by: &str, summary: Option<&str>) -> StoreResult<Task> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        if let Some(summary) = summary {
            tx.execute(
                "UPDATE tasks SET status = 'closed', progress = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, summary, now],
            )?;
        } else {
            tx.execute(
                "UPDATE tasks SET status = 'closed', updated_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;
        }
        tx.execute(
            "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
             VALUES (?1, 'task', NULL, 'closed', ?2, ?3)",
            params![id, triggered_by, now],
        )?;
        let after = tx.query_row("SELECT * FROM tasks WHERE id = ?1", [id], row_to_task)?;
        tx.commit()?;
        Ok(after)
    }

    pub fn transition_log_for(&self, entity_type: &str, entity_id: i64) -> StoreResult<Vec<TransitionLogEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM transition_log WHERE entity_type = ?1 AND entity_id = ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![entity_type, entity_id], row_to_transition)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn append_transition_log(
        &self,
        entity_type: &str,
        entity_id: i64,
        from_status: Option<&str>,
        to_status: &str,
        triggered_by: &str,
    ) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO transition_log (entity_id, entity_type, from_status, to_status, triggered_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![entity_id, entity_type, from_status, to_status, triggered_by, minion_core::now_iso()],
        )?;
        Ok(())
    }
}
