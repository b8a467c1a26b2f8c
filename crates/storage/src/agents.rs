// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent rows: registration, HP fields, session/process bookkeeping.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub class: String,
    pub model: Option<String>,
    pub description: Option<String>,
    pub transport: String,
    pub crew: Option<String>,
    pub registered_at: String,
    pub last_seen: String,
    pub last_inbox_check: Option<String>,
    pub context_summary: Option<String>,
    pub context_updated_at: Option<String>,
    pub current_zone: Option<String>,
    pub status: String,
    pub hp_input_tokens: i64,
    pub hp_output_tokens: i64,
    pub hp_tokens_limit: i64,
    pub hp_turn_input: i64,
    pub hp_turn_output: i64,
    pub hp_updated_at: Option<String>,
    /// JSON array of thresholds already fired, e.g. `[25, 10]`.
    pub hp_alerts_fired: String,
    pub session_id: Option<String>,
    pub pid: Option<i64>,
    pub generation: i64,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_agent(row: &Row) -> rusqlite::Result<Agent> {
    Ok(Agent {
        name: row.get("name")?,
        class: row.get("class")?,
        model: row.get("model")?,
        description: row.get("description")?,
        transport: row.get("transport")?,
        crew: row.get("crew")?,
        registered_at: row.get("registered_at")?,
        last_seen: row.get("last_seen")?,
        last_inbox_check: row.get("last_inbox_check")?,
        context_summary: row.get("context_summary")?,
        context_updated_at: row.get("context_updated_at")?,
        current_zone: row.get("current_zone")?,
        status: row.get("status")?,
        hp_input_tokens: row.get("hp_input_tokens")?,
        hp_output_tokens: row.get("hp_output_tokens")?,
        hp_tokens_limit: row.get("hp_tokens_limit")?,
        hp_turn_input: row.get("hp_turn_input")?,
        hp_turn_output: row.get("hp_turn_output")?,
        hp_updated_at: row.get("hp_updated_at")?,
        hp_alerts_fired: row.get("hp_alerts_fired")?,
        session_id: row.get("session_id")?,
        pid: row.get("pid")?,
        generation: row.get("generation")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub struct RegisterInput<'a> {
    pub name: &'a str,
    pub class: &'a str,
    pub model: Option<&'a str>,
    pub description: Option<&'a str>,
    pub transport: &'a str,
    pub crew: Option<&'a str>,
}

impl Store {
    /// Upsert the agent row: `last_seen=now`, `status="waiting for work"`.
    /// Existing non-null `model`/`description` survive a re-register that
    /// passes `None`/empty for them.
    pub fn register_agent(&self, input: RegisterInput<'_>) -> StoreResult<Agent> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        let existing: Option<Agent> = conn
            .query_row(
                "SELECT * FROM agents WHERE name = ?1",
                [input.name],
                row_to_agent,
            )
            .optional()?;

        let model = input
            .model
            .filter(|m| !m.is_empty())
            .or(existing.as_ref().and_then(|a| a.model.as_deref()))
            .map(str::to_string);
        let description = input
            .description
            .filter(|d| !d.is_empty())
            .or(existing.as_ref().and_then(|a| a.description.as_deref()))
            .map(str::to_string);
        let crew = input
            .crew
            .or(existing.as_ref().and_then(|a| a.crew.as_deref()))
            .map(str::to_string);
        let registered_at = existing
            .as_ref()
            .map(|a| a.registered_at.clone())
            .unwrap_or_else(|| now.clone());
        let created_at = existing
            .as_ref()
            .map(|a| a.created_at.clone())
            .unwrap_or_else(|| now.clone());

        conn.execute(
            "INSERT INTO agents (
                name, class, model, description, transport, crew,
                registered_at, last_seen, status, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 'waiting for work', ?8, ?7)
             ON CONFLICT(name) DO UPDATE SET
                class = excluded.class,
                model = excluded.model,
                description = excluded.description,
                transport = excluded.transport,
                crew = excluded.crew,
                last_seen = excluded.last_seen,
                status = excluded.status,
                updated_at = excluded.updated_at",
            params![
                input.name,
                input.class,
                model,
                description,
                input.transport,
                crew,
                now,
                created_at,
            ],
        )?;
        let _ = registered_at;

        conn.query_row("SELECT * FROM agents WHERE name = ?1", [input.name], row_to_agent)
            .map_err(Into::into)
    }

    pub fn get_agent(&self, name: &str) -> StoreResult<Option<Agent>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM agents WHERE name = ?1", [name], row_to_agent)
            .optional()
            .map_err(Into::into)
    }

    pub fn list_agents(&self) -> StoreResult<Vec<Agent>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM agents ORDER BY name")?;
        let rows = stmt.query_map([], row_to_agent)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn deregister_agent(&self, name: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM agents WHERE name = ?1", [name])?;
        conn.execute("DELETE FROM file_claims WHERE agent = ?1", [name])?;
        conn.execute("DELETE FROM file_claim_waitlist WHERE agent = ?1", [name])?;
        Ok(())
    }

    pub fn touch_last_seen(&self, name: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET last_seen = ?2, updated_at = ?2 WHERE name = ?1",
            params![name, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn touch_inbox_check(&self, name: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "UPDATE agents SET last_seen = ?2, last_inbox_check = ?2, updated_at = ?2 WHERE name = ?1",
            params![name, now],
        )?;
        Ok(())
    }

    pub fn set_agent_status(&self, name: &str, status: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET status = ?2, updated_at = ?3 WHERE name = ?1",
            params![name, status, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn set_agent_context(&self, name: &str, summary: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "UPDATE agents SET context_summary = ?2, context_updated_at = ?3, updated_at = ?3 WHERE name = ?1",
            params![name, summary, now],
        )?;
        Ok(())
    }

    pub fn touch_context_updated(&self, name: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "UPDATE agents SET context_updated_at = ?2, updated_at = ?2 WHERE name = ?1",
            params![name, now],
        )?;
        Ok(())
    }

    pub fn set_agent_zone(&self, name: &str, zone: Option<&str>) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET current_zone = ?2, updated_at = ?3 WHERE name = ?1",
            params![name, zone, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn set_agent_session(&self, name: &str, session_id: Option<&str>) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET session_id = ?2, updated_at = ?3 WHERE name = ?1",
            params![name, session_id, minion_core::now_iso()],
        )?;
        Ok(())
    }

    pub fn set_agent_process(&self, name: &str, pid: Option<i64>, generation: i64) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET pid = ?2, generation = ?3, updated_at = ?4 WHERE name = ?1",
            params![name, pid, generation, minion_core::now_iso()],
        )?;
        Ok(())
    }

    /// Raw HP field write. Threshold-alert bookkeeping is layered on by
    /// `minion_engine::hp` — the Store only persists the numbers.
    #[allow(clippy::too_many_arguments)]
    pub fn update_agent_hp(
        &self,
        name: &str,
        input_tokens: i64,
        output_tokens: i64,
        limit: i64,
        turn_input: i64,
        turn_output: i64,
    ) -> StoreResult<()> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "UPDATE agents SET
                hp_input_tokens = ?2, hp_output_tokens = ?3, hp_tokens_limit = ?4,
                hp_turn_input = ?5, hp_turn_output = ?6, hp_updated_at = ?7, updated_at = ?7
             WHERE name = ?1",
            params![name, input_tokens, output_tokens, limit, turn_input, turn_output, now],
        )?;
        Ok(())
    }

    pub fn set_hp_alerts_fired(&self, name: &str, alerts_json: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE agents SET hp_alerts_fired = ?2, updated_at = ?3 WHERE name = ?1",
            params![name, alerts_json, minion_core::now_iso()],
        )?;
        Ok(())
    }

    /// Lead-only zone reassignment: renames the agent row and rewrites
    /// historical message/broadcast_reads attribution so history stays
    /// readable under the new name. Supplemented feature, see DESIGN.md.
    pub fn rename_agent(&self, old: &str, new: &str) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("UPDATE agents SET name = ?2 WHERE name = ?1", params![old, new])?;
        tx.execute(
            "UPDATE messages SET from_agent = ?2 WHERE from_agent = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE messages SET to_agent = ?2 WHERE to_agent = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE messages SET cc_original_to = ?2 WHERE cc_original_to = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE broadcast_reads SET agent = ?2 WHERE agent = ?1",
            params![old, new],
        )?;
        tx.execute(
            "UPDATE tasks SET assigned_to = ?2 WHERE assigned_to = ?1",
            params![old, new],
        )?;
        tx.commit()?;
        Ok(())
    }
}
