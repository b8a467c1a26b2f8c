// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-wide flags, per-agent retire markers, fenix-down dumps, and the
//! cooperative `agent_interrupt` table.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

pub const FLAG_MOON_CRASH: &str = "moon_crash";
pub const FLAG_STAND_DOWN: &str = "stand_down";

impl Store {
    pub fn set_flag(&self, key: &str, value: &str, set_by: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO flags (key, value, set_by, set_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, set_by = excluded.set_by, set_at = excluded.set_at",
            params![key, value, set_by, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn clear_flag(&self, key: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM flags WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn flag_is_set(&self, key: &str) -> StoreResult<bool> {
        let conn = self.connect()?;
        let value: Option<String> = conn
            .query_row("SELECT value FROM flags WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        Ok(matches!(value.as_deref(), Some("1") | Some("true")))
    }

    pub fn get_flag(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.connect()?;
        conn.query_row("SELECT value FROM flags WHERE key = ?1", [key], |r| r.get(0))
            .optional()
            .map_err(Into::into)
    }

    pub fn clear_all_flags(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM flags", [])?;
        Ok(())
    }

    pub fn set_retire_marker(&self, agent: &str, set_by: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO retire_markers (agent, set_at, set_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(agent) DO UPDATE SET set_at = excluded.set_at, set_by = excluded.set_by",
            params![agent, minion_core::now_iso(), set_by],
        )?;
        Ok(())
    }

    pub fn has_retire_marker(&self, agent: &str) -> StoreResult<bool> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM retire_markers WHERE agent = ?1",
            [agent],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn clear_retire_marker(&self, agent: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM retire_markers WHERE agent = ?1", [agent])?;
        Ok(())
    }

    pub fn clear_all_retire_markers(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM retire_markers", [])?;
        Ok(())
    }

    pub fn record_fenix_down(&self, agent: &str, files_json: &str, manifest: &str) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO fenix_down_records (agent, files, manifest, consumed, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![agent, files_json, manifest, minion_core::now_iso()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns and marks-consumed the latest unconsumed fenix-down record
    /// for `agent`, read on cold-start.
    pub fn take_unconsumed_fenix_down(&self, agent: &str) -> StoreResult<Option<FenixDownRecord>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let rec: Option<FenixDownRecord> = tx
            .query_row(
                "SELECT * FROM fenix_down_records WHERE agent = ?1 AND consumed = 0 ORDER BY id DESC LIMIT 1",
                [agent],
                row_to_fenix,
            )
            .optional()?;
        if let Some(rec) = &rec {
            tx.execute("UPDATE fenix_down_records SET consumed = 1 WHERE id = ?1", [rec.id])?;
        }
        tx.commit()?;
        Ok(rec)
    }

    pub fn set_interrupt(&self, agent: &str, set_by: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO agent_interrupt (agent, set_at, set_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(agent) DO UPDATE SET set_at = excluded.set_at, set_by = excluded.set_by",
            params![agent, minion_core::now_iso(), set_by],
        )?;
        Ok(())
    }

    pub fn has_interrupt(&self, agent: &str) -> StoreResult<bool> {
        let conn = self.connect()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM agent_interrupt WHERE agent = ?1",
            [agent],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn clear_interrupt(&self, agent: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM agent_interrupt WHERE agent = ?1", [agent])?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FenixDownRecord {
    pub id: i64,
    pub agent: String,
    pub files: String,
    pub manifest: String,
    pub consumed: bool,
    pub created_at: String,
}

fn row_to_fenix(row: &Row) -> rusqlite::Result<FenixDownRecord> {
    Ok(FenixDownRecord {
        id: row.get("id")?,
        agent: row.get("agent")?,
        files: row.get("files")?,
        manifest: row.get("manifest")?,
        consumed: row.get::<_, i64>("consumed")? != 0,
        created_at: row.get("created_at")?,
    })
}
