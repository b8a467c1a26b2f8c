// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive file claims and their FIFO waitlist. Granting a claim and
//! noting a waiter happen inside one transaction.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileClaim {
    pub file_path: String,
    pub agent: String,
    pub claimed_at: String,
}

fn row_to_claim(row: &Row) -> rusqlite::Result<FileClaim> {
    Ok(FileClaim {
        file_path: row.get("file_path")?,
        agent: row.get("agent")?,
        claimed_at: row.get("claimed_at")?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waiter {
    pub file_path: String,
    pub agent: String,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClaimOutcome {
    Granted(FileClaim),
    AlreadyOurs(FileClaim),
    /// Held by someone else; caller was added to the waitlist.
    Waitlisted(FileClaim),
}

impl Store {
    pub fn claim_file(&self, file_path: &str, agent: &str) -> StoreResult<ClaimOutcome> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = minion_core::now_iso();
        let existing: Option<FileClaim> = tx
            .query_row("SELECT * FROM file_claims WHERE file_path = ?1", [file_path], row_to_claim)
            .optional()?;
        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO file_claims (file_path, agent, claimed_at) VALUES (?1, ?2, ?3)",
                    params![file_path, agent, now],
                )?;
                ClaimOutcome::Granted(FileClaim {
                    file_path: file_path.to_string(),
                    agent: agent.to_string(),
                    claimed_at: now,
                })
            }
            Some(claim) if claim.agent == agent => ClaimOutcome::AlreadyOurs(claim),
            Some(claim) => {
                tx.execute(
                    "INSERT OR IGNORE INTO file_claim_waitlist (file_path, agent, added_at) VALUES (?1, ?2, ?3)",
                    params![file_path, agent, now],
                )?;
                ClaimOutcome::Waitlisted(claim)
            }
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Releases the claim and returns the front of its waitlist (if any) as
    /// a "notify" hint — the front waiter is surfaced but NOT auto-promoted.
    pub fn release_file(&self, file_path: &str, agent: &str) -> StoreResult<Option<Waiter>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM file_claims WHERE file_path = ?1 AND agent = ?2",
            params![file_path, agent],
        )?;
        let next: Option<Waiter> = tx
            .query_row(
                "SELECT file_path, agent, added_at FROM file_claim_waitlist
                 WHERE file_path = ?1 ORDER BY added_at LIMIT 1",
                [file_path],
                |row| {
                    Ok(Waiter {
                        file_path: row.get(0)?,
                        agent: row.get(1)?,
                        added_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        tx.commit()?;
        Ok(next)
    }

    pub fn release_all_for_agent(&self, agent: &str) -> StoreResult<Vec<Waiter>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT file_path FROM file_claims WHERE agent = ?1")?;
        let files: Vec<String> = stmt.query_map([agent], |r| r.get(0))?.collect::<Result<_, _>>()?;
        drop(stmt);
        let mut notifications = Vec::new();
        for file in files {
            if let Some(waiter) = self.release_file(&file, agent)? {
                notifications.push(waiter);
            }
        }
        Ok(notifications)
    }

    pub fn list_claims(&self) -> StoreResult<Vec<FileClaim>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM file_claims ORDER BY file_path")?;
        let rows = stmt.query_map([], row_to_claim)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn get_claim(&self, file_path: &str) -> StoreResult<Option<FileClaim>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM file_claims WHERE file_path = ?1", [file_path], row_to_claim)
            .optional()
            .map_err(Into::into)
    }
}
