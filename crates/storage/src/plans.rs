// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Battle plans (single-active invariant) and the append-only raid log.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePlan {
    pub id: i64,
    pub set_by: String,
    pub plan_file: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_plan(row: &Row) -> rusqlite::Result<BattlePlan> {
    Ok(BattlePlan {
        id: row.get("id")?,
        set_by: row.get("set_by")?,
        plan_file: row.get("plan_file")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidLogEntry {
    pub id: i64,
    pub agent: String,
    pub entry_file: String,
    pub priority: String,
    pub created_at: String,
}

fn row_to_raid(row: &Row) -> rusqlite::Result<RaidLogEntry> {
    Ok(RaidLogEntry {
        id: row.get("id")?,
        agent: row.get("agent")?,
        entry_file: row.get("entry_file")?,
        priority: row.get("priority")?,
        created_at: row.get("created_at")?,
    })
}

impl Store {
    /// Sets a new active plan, demoting any previous active row to
    /// `superseded` in the same transaction: only one plan is ever active.
    pub fn set_battle_plan(&self, set_by: &str, plan_file: &str) -> StoreResult<BattlePlan> {
        let mut conn = self.connect()?;
        let now = minion_core::now_iso();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE battle_plans SET status = 'superseded', updated_at = ?1 WHERE status = 'active'",
            [&now],
        )?;
        tx.execute(
            "INSERT INTO battle_plans (set_by, plan_file, status, created_at, updated_at)
             VALUES (?1, ?2, 'active', ?3, ?3)",
            params![set_by, plan_file, now],
        )?;
        let id = tx.last_insert_rowid();
        let plan = tx.query_row("SELECT * FROM battle_plans WHERE id = ?1", [id], row_to_plan)?;
        tx.commit()?;
        Ok(plan)
    }

    pub fn active_battle_plan(&self) -> StoreResult<Option<BattlePlan>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT * FROM battle_plans WHERE status = 'active' ORDER BY id DESC LIMIT 1",
            [],
            row_to_plan,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn set_battle_plan_status(&self, id: i64, status: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE battle_plans SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn append_raid_log(&self, agent: &str, entry_file: &str, priority: &str) -> StoreResult<RaidLogEntry> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "INSERT INTO raid_log (agent, entry_file, priority, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![agent, entry_file, priority, now],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM raid_log WHERE id = ?1", [id], row_to_raid)
            .map_err(Into::into)
    }

    pub fn recent_raid_log(&self, limit: i64) -> StoreResult<Vec<RaidLogEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM raid_log ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit], row_to_raid)?;
        let mut out: Vec<RaidLogEntry> = rows.collect::<Result<_, _>>()?;
        out.reverse();
        Ok(out)
    }
}
