// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only daemon telemetry: one `invocation_log` row per child LLM
//! invocation, one `compaction_log` row per detected context compaction.
//! Owned exclusively by the daemon runner for its own agent.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationLogEntry {
    pub id: i64,
    pub agent: String,
    pub pid: Option<i64>,
    pub model: Option<String>,
    pub generation: i64,
    pub rss_bytes: Option<i64>,
    pub tokens_in: Option<i64>,
    pub tokens_out: Option<i64>,
    pub exit_code: Option<i64>,
    pub compacted: bool,
    pub timed_out: bool,
    pub interrupted: bool,
    pub started_at: String,
    pub ended_at: Option<String>,
}

fn row_to_invocation(row: &Row) -> rusqlite::Result<InvocationLogEntry> {
    Ok(InvocationLogEntry {
        id: row.get("id")?,
        agent: row.get("agent")?,
        pid: row.get("pid")?,
        model: row.get("model")?,
        generation: row.get("generation")?,
        rss_bytes: row.get("rss_bytes")?,
        tokens_in: row.get("tokens_in")?,
        tokens_out: row.get("tokens_out")?,
        exit_code: row.get("exit_code")?,
        compacted: row.get::<_, i64>("compacted")? != 0,
        timed_out: row.get::<_, i64>("timed_out")? != 0,
        interrupted: row.get::<_, i64>("interrupted")? != 0,
        started_at: row.get("started_at")?,
        ended_at: row.get("ended_at")?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionLogEntry {
    pub id: i64,
    pub agent: String,
    pub model: Option<String>,
    pub pid: Option<i64>,
    pub rss_pre: Option<i64>,
    pub tokens_pre: Option<i64>,
    pub tokens_post: Option<i64>,
    pub generation: i64,
    pub compacted_at: String,
}

fn row_to_compaction(row: &Row) -> rusqlite::Result<CompactionLogEntry> {
    Ok(CompactionLogEntry {
        id: row.get("id")?,
        agent: row.get("agent")?,
        model: row.get("model")?,
        pid: row.get("pid")?,
        rss_pre: row.get("rss_pre")?,
        tokens_pre: row.get("tokens_pre")?,
        tokens_post: row.get("tokens_post")?,
        generation: row.get("generation")?,
        compacted_at: row.get("compacted_at")?,
    })
}

impl Store {
    pub fn begin_invocation(&self, agent: &str, pid: Option<i64>, model: Option<&str>, generation: i64) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO invocation_log (agent, pid, model, generation, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![agent, pid, model, generation, minion_core::now_iso()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn end_invocation(
        &self,
        id: i64,
        rss_bytes: Option<i64>,
        tokens_in: Option<i64>,
        tokens_out: Option<i64>,
        exit_code: Option<i64>,
        compacted: bool,
        timed_out: bool,
        interrupted: bool,
    ) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE invocation_log SET
                rss_bytes = ?2, tokens_in = ?3, tokens_out = ?4, exit_code = ?5,
                compacted = ?6, timed_out = ?7, interrupted = ?8, ended_at = ?9
             WHERE id = ?1",
            params![id, rss_bytes, tokens_in, tokens_out, exit_code, compacted as i64, timed_out as i64, interrupted as i64, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn recent_invocations(&self, agent: &str, limit: i64) -> StoreResult<Vec<InvocationLogEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM invocation_log WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![agent, limit], row_to_invocation)?;
        let mut out: Vec<InvocationLogEntry> = rows.collect::<Result<_, _>>()?;
        out.reverse();
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_compaction(
        &self,
        agent: &str,
        model: Option<&str>,
        pid: Option<i64>,
        rss_pre: Option<i64>,
        tokens_pre: Option<i64>,
        tokens_post: Option<i64>,
        generation: i64,
    ) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO compaction_log (agent, model, pid, rss_pre, tokens_pre, tokens_post, generation, compacted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![agent, model, pid, rss_pre, tokens_pre, tokens_post, generation, minion_core::now_iso()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn recent_compactions(&self, agent: &str, limit: i64) -> StoreResult<Vec<CompactionLogEntry>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM compaction_log WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![agent, limit], row_to_compaction)?;
        let mut out: Vec<CompactionLogEntry> = rows.collect::<Result<_, _>>()?;
        out.reverse();
        Ok(out)
    }
}
