// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intel docs and their links to tasks/requirements. See DESIGN.md for
//! the filesystem-is-source-of-truth rationale.

use crate::error::StoreResult;
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelDoc {
    pub slug: String,
    pub doc_path: String,
    /// JSON array of tag strings.
    pub tags: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

fn row_to_doc(row: &Row) -> rusqlite::Result<IntelDoc> {
    Ok(IntelDoc {
        slug: row.get("slug")?,
        doc_path: row.get("doc_path")?,
        tags: row.get("tags")?,
        description: row.get("description")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelLink {
    pub intel_slug: String,
    pub entity_type: String,
    pub entity_id: String,
}

impl Store {
    pub fn add_intel_doc(
        &self,
        slug: &str,
        doc_path: &str,
        tags_json: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> StoreResult<IntelDoc> {
        let conn = self.connect()?;
        let now = minion_core::now_iso();
        conn.execute(
            "INSERT INTO intel_docs (slug, doc_path, tags, description, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![slug, doc_path, tags_json, description, created_by, now],
        )?;
        conn.query_row("SELECT * FROM intel_docs WHERE slug = ?1", [slug], row_to_doc)
            .map_err(Into::into)
    }

    pub fn get_intel_doc(&self, slug: &str) -> StoreResult<Option<IntelDoc>> {
        let conn = self.connect()?;
        conn.query_row("SELECT * FROM intel_docs WHERE slug = ?1", [slug], row_to_doc)
            .optional()
            .map_err(Into::into)
    }

    pub fn list_intel_docs(&self) -> StoreResult<Vec<IntelDoc>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM intel_docs ORDER BY slug")?;
        let rows = stmt.query_map([], row_to_doc)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn link_intel(&self, slug: &str, entity_type: &str, entity_id: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO intel_links (intel_slug, entity_type, entity_id) VALUES (?1, ?2, ?3)",
            params![slug, entity_type, entity_id],
        )?;
        Ok(())
    }

    pub fn intel_for_entity(&self, entity_type: &str, entity_id: &str) -> StoreResult<Vec<IntelDoc>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT d.* FROM intel_docs d
             JOIN intel_links l ON l.intel_slug = d.slug
             WHERE l.entity_type = ?1 AND l.entity_id = ?2
             ORDER BY d.slug",
        )?;
        let rows = stmt.query_map(params![entity_type, entity_id], row_to_doc)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn links_for_slug(&self, slug: &str) -> StoreResult<Vec<IntelLink>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT intel_slug, entity_type, entity_id FROM intel_links WHERE intel_slug = ?1")?;
        let rows = stmt.query_map([slug], |row| {
            Ok(IntelLink {
                intel_slug: row.get(0)?,
                entity_type: row.get(1)?,
                entity_id: row.get(2)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}
