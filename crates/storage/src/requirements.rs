// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requirement rows: a tree keyed by `file_path`, never cyclic by
//! construction (parent always registered before children point at it).

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: i64,
    pub file_path: String,
    pub origin: String,
    pub stage: String,
    pub flow_type: String,
    pub parent_id: Option<i64>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_req(row: &Row) -> rusqlite::Result<Requirement> {
    Ok(Requirement {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        origin: row.get("origin")?,
        stage: row.get("stage")?,
        flow_type: row.get("flow_type")?,
        parent_id: row.get("parent_id")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub struct NewRequirement<'a> {
    pub file_path: &'a str,
    pub origin: &'a str,
    pub flow_type: &'a str,
    pub parent_id: Option<i64>,
    pub created_by: &'a str,
    pub stage: &'a str,
}

impl Store {
    pub fn register_requirement(&self, input: NewRequirement<'_>) -> StoreResult<Requirement> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "INSERT INTO requirements (file_path, origin, stage, flow_type, parent_id, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![input.file_path, input.origin, input.stage, input.flow_type, input.parent_id, input.created_by, now],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM requirements WHERE id = ?1", [id], row_to_req)
            .map_err(Into::into)
    }

    pub fn get_requirement(&self, id: i64) -> StoreResult<Option<Requirement>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM requirements WHERE id = ?1", [id], row_to_req)
            .optional()
            .map_err(Into::into)
    }

    pub fn get_requirement_by_path(&self, file_path: &str) -> StoreResult<Option<Requirement>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM requirements WHERE file_path = ?1", [file_path], row_to_req)
            .optional()
            .map_err(Into::into)
    }

    pub fn list_requirements(&self) -> StoreResult<Vec<Requirement>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM requirements ORDER BY file_path")?;
        let rows = stmt.query_map([], row_to_req)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn children_of(&self, parent_id: i64) -> StoreResult<Vec<Requirement>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM requirements WHERE parent_id = ?1 ORDER BY file_path")?;
        let rows = stmt.query_map([parent_id], row_to_req)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    /// All requirement ids whose `file_path` is `root.file_path` or begins
    /// with `root.file_path + "/"` (the descendant definition used by the
    /// `all_*_tasks_closed` gates).
    pub fn descendant_ids(&self, root: &Requirement) -> StoreResult<Vec<i64>> {
        let conn = self.connect()?;
        let prefix = format!("{}/", root.file_path);
        let mut stmt = conn.prepare("SELECT id, file_path FROM requirements")?;
        let rows: Vec<(i64, String)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<_, _>>()?;
        Ok(rows
            .into_iter()
            .filter(|(_, path)| *path == root.file_path || path.starts_with(&prefix))
            .map(|(id, _)| id)
            .collect())
    }

    pub fn set_requirement_stage(&self, id: i64, stage: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE requirements SET stage = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, stage, minion_core::now_iso()],
        )?;
        Ok(())
    }
}
