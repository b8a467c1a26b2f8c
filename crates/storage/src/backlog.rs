// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog items. The filesystem folder under `backlog/<type>s/<slug>/` is
//! the source of truth ; these rows are an index over it.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklogItem {
    pub id: i64,
    pub file_path: String,
    pub item_type: String,
    pub title: String,
    pub priority: String,
    pub status: String,
    pub source: Option<String>,
    pub promoted_to: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_item(row: &Row) -> rusqlite::Result<BacklogItem> {
    Ok(BacklogItem {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        item_type: row.get("item_type")?,
        title: row.get("title")?,
        priority: row.get("priority")?,
        status: row.get("status")?,
        source: row.get("source")?,
        promoted_to: row.get("promoted_to")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub struct NewBacklogItem<'a> {
    pub file_path: &'a str,
    pub item_type: &'a str,
    pub title: &'a str,
    pub priority: &'a str,
    pub source: Option<&'a str>,
}

impl Store {
    pub fn add_backlog_item(&self, input: NewBacklogItem<'_>) -> StoreResult<BacklogItem> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "INSERT INTO backlog_items (file_path, item_type, title, priority, status, source, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?6, ?6)",
            params![input.file_path, input.item_type, input.title, input.priority, input.source, now],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM backlog_items WHERE id = ?1", [id], row_to_item)
            .map_err(Into::into)
    }

    pub fn get_backlog_item(&self, file_path: &str) -> StoreResult<Option<BacklogItem>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM backlog_items WHERE file_path = ?1", [file_path], row_to_item)
            .optional()
            .map_err(Into::into)
    }

    pub fn list_backlog_items(&self) -> StoreResult<Vec<BacklogItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM backlog_items ORDER BY file_path")?;
        let rows = stmt.query_map([], row_to_item)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn set_backlog_status(&self, file_path: &str, status: &str, promoted_to: Option<&str>) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE backlog_items SET status = ?2, promoted_to = COALESCE(?3, promoted_to), updated_at = ?4 WHERE file_path = ?1",
            params![file_path, status, promoted_to, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn update_backlog_item(&self, file_path: &str, title: Option<&str>, priority: Option<&str>) -> StoreResult<()> {
        let conn = self.connect()?;
        let existing = self.get_backlog_item(file_path)?;
        let Some(existing) = existing else {
            return Ok(());
        };
        conn.execute(
            "UPDATE backlog_items SET title = ?2, priority = ?3, updated_at = ?4 WHERE file_path = ?1",
            params![
                file_path,
                title.unwrap_or(&existing.title),
                priority.unwrap_or(&existing.priority),
                minion_core::now_iso()
            ],
        )?;
        Ok(())
    }
}
