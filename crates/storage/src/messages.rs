// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message rows, including the reserved `"all"` broadcast recipient and the
//! per-recipient `broadcast_reads` consumption table.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

pub const BROADCAST_RECIPIENT: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from_agent: String,
    pub to_agent: String,
    pub content_file: String,
    pub is_cc: bool,
    pub cc_original_to: Option<String>,
    pub read_flag: bool,
    pub created_at: String,
}

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get("id")?,
        from_agent: row.get("from_agent")?,
        to_agent: row.get("to_agent")?,
        content_file: row.get("content_file")?,
        is_cc: row.get::<_, i64>("is_cc")? != 0,
        cc_original_to: row.get("cc_original_to")?,
        read_flag: row.get::<_, i64>("read_flag")? != 0,
        created_at: row.get("created_at")?,
    })
}

pub struct NewMessage<'a> {
    pub from_agent: &'a str,
    pub to_agent: &'a str,
    pub content_file: &'a str,
    pub is_cc: bool,
    pub cc_original_to: Option<&'a str>,
}

impl Store {
    /// Content file must already have been written atomically by the
    /// caller before this is called.
    pub fn insert_message(&self, msg: NewMessage<'_>) -> StoreResult<Message> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "INSERT INTO messages (from_agent, to_agent, content_file, is_cc, cc_original_to, read_flag, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![msg.from_agent, msg.to_agent, msg.content_file, msg.is_cc as i64, msg.cc_original_to, now],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row("SELECT * FROM messages WHERE id = ?1", [id], row_to_message)
            .map_err(Into::into)
    }

    pub fn unread_direct_count(&self, agent: &str) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE to_agent = ?1 AND read_flag = 0",
            [agent],
            |r| r.get(0),
        )
        .map_err(Into::into)
    }

    pub fn unread_broadcast_count(&self, agent: &str) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT COUNT(*) FROM messages m
             WHERE m.to_agent = ?2
               AND NOT EXISTS (SELECT 1 FROM broadcast_reads b WHERE b.agent = ?1 AND b.message_id = m.id)",
            params![agent, BROADCAST_RECIPIENT],
            |r| r.get(0),
        )
        .map_err(Into::into)
    }

    pub fn unread_direct(&self, agent: &str) -> StoreResult<Vec<Message>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE to_agent = ?1 AND read_flag = 0 ORDER BY created_at",
        )?;
        let rows = stmt.query_map([agent], row_to_message)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn unread_broadcasts(&self, agent: &str) -> StoreResult<Vec<Message>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages m
             WHERE m.to_agent = ?2
               AND NOT EXISTS (SELECT 1 FROM broadcast_reads b WHERE b.agent = ?1 AND b.message_id = m.id)
             ORDER BY m.created_at",
        )?;
        let rows = stmt.query_map(params![agent, BROADCAST_RECIPIENT], row_to_message)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn mark_direct_read(&self, message_id: i64) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("UPDATE messages SET read_flag = 1 WHERE id = ?1", [message_id])?;
        Ok(())
    }

    pub fn mark_broadcast_read(&self, agent: &str, message_id: i64) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO broadcast_reads (agent, message_id, read_at) VALUES (?1, ?2, ?3)",
            params![agent, message_id, minion_core::now_iso()],
        )?;
        Ok(())
    }

    /// All broadcasts older than `older_than_iso` not yet consumed by
    /// `agent`; used to auto-dismiss stale broadcasts on re-register.
    pub fn stale_unread_broadcasts(&self, agent: &str, older_than_iso: &str) -> StoreResult<Vec<Message>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages m
             WHERE m.to_agent = ?2 AND m.created_at < ?3
               AND NOT EXISTS (SELECT 1 FROM broadcast_reads b WHERE b.agent = ?1 AND b.message_id = m.id)",
        )?;
        let rows = stmt.query_map(params![agent, BROADCAST_RECIPIENT, older_than_iso], row_to_message)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn history(&self, agent: &str, limit: i64) -> StoreResult<Vec<Message>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE to_agent = ?1 OR from_agent = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![agent, limit], row_to_message)?;
        let mut out: Vec<Message> = rows.collect::<Result<_, _>>()?;
        out.reverse();
        Ok(out)
    }

    pub fn purge_direct_older_than(&self, agent: &str, older_than_iso: &str) -> StoreResult<u64> {
        let conn = self.connect()?;
        let n = conn.execute(
            "DELETE FROM messages WHERE to_agent = ?1 AND to_agent != ?2 AND created_at < ?3",
            params![agent, BROADCAST_RECIPIENT, older_than_iso],
        )?;
        Ok(n as u64)
    }

    pub fn purge_mark_broadcasts_read(&self, agent: &str, older_than_iso: &str) -> StoreResult<u64> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM messages WHERE to_agent = ?1 AND created_at < ?2",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![BROADCAST_RECIPIENT, older_than_iso], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        for id in &ids {
            conn.execute(
                "INSERT OR IGNORE INTO broadcast_reads (agent, message_id, read_at) VALUES (?1, ?2, ?3)",
                params![agent, id, minion_core::now_iso()],
            )?;
        }
        Ok(ids.len() as u64)
    }

    pub fn purge_orphan_broadcast_reads(&self) -> StoreResult<u64> {
        let conn = self.connect()?;
        let n = conn.execute(
            "DELETE FROM broadcast_reads WHERE message_id NOT IN (SELECT id FROM messages)",
            [],
        )?;
        Ok(n as u64)
    }
}
