// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intel docs : add/link/list/find, plus a
//! war-plan aggregate that fuses every doc linked to a requirement with
//! the docs linked to its open tasks.

use crate::error::{EngineError, EngineResult};
use minion_store::{IntelDoc, Store};
use serde::Deserialize;
use std::path::Path;

pub fn add(
    store: &Store,
    slug: &str,
    doc_path: &str,
    tags: &[String],
    description: Option<&str>,
    created_by: &str,
) -> EngineResult<IntelDoc> {
    if store.get_intel_doc(slug)?.is_some() {
        return Err(EngineError::invalid(format!("intel doc {slug} already exists")));
    }
    let tags_json = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
    store
        .add_intel_doc(slug, doc_path, &tags_json, description, created_by)
        .map_err(Into::into)
}

pub fn link(store: &Store, slug: &str, entity_type: &str, entity_id: &str) -> EngineResult<()> {
    show(store, slug)?;
    store.link_intel(slug, entity_type, entity_id).map_err(Into::into)
}

pub fn list(store: &Store) -> EngineResult<Vec<IntelDoc>> {
    store.list_intel_docs().map_err(Into::into)
}

pub fn show(store: &Store, slug: &str) -> EngineResult<IntelDoc> {
    store
        .get_intel_doc(slug)?
        .ok_or_else(|| EngineError::blocked(format!("intel doc {slug} not found")))
}

/// `find` — docs tagged with every one of `tags`, newest first.
pub fn find(store: &Store, tags: &[String]) -> EngineResult<Vec<IntelDoc>> {
    let all = store.list_intel_docs()?;
    Ok(all
        .into_iter()
        .filter(|doc| {
            let doc_tags: Vec<String> = serde_json::from_str(&doc.tags).unwrap_or_default();
            tags.iter().all(|t| doc_tags.contains(t))
        })
        .collect())
}

/// War-plan aggregate: every intel doc linked directly to the requirement,
/// plus docs linked to any of its (non-terminal) tasks.
pub fn war_plan(store: &Store, requirement_id: i64) -> EngineResult<Vec<IntelDoc>> {
    let mut docs = store.intel_for_entity("requirement", &requirement_id.to_string())?;
    let tasks = store.tasks_for_requirement_ids(&[requirement_id], None)?;
    for task in tasks {
        docs.extend(store.intel_for_entity("task", &task.id.to_string())?);
    }
    docs.sort_by(|a, b| a.slug.cmp(&b.slug));
    docs.dedup_by(|a, b| a.slug == b.slug);
    Ok(docs)
}

#[derive(Debug, Deserialize, Default, serde::Serialize)]
struct Frontmatter {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    linked_tasks: Vec<i64>,
    #[serde(default)]
    linked_reqs: Vec<i64>,
    #[serde(default)]
    author: Option<String>,
}

fn parse_frontmatter(body: &str) -> Frontmatter {
    let Some(rest) = body.strip_prefix("---\n") else { return Frontmatter::default() };
    let Some(end) = rest.find("\n---") else { return Frontmatter::default() };
    serde_yaml::from_str(&rest[..end]).unwrap_or_default()
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReindexOutcome {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Walks `<intel_root>` registering any `<slug>.md` doc not already in the
/// DB, parsing `tags`/`linked_tasks`/`linked_reqs`/`author` frontmatter and
/// recreating its links. Idempotent: the markdown file on disk is the
/// source of truth.
pub fn reindex(store: &Store, intel_root: &Path, default_author: &str) -> EngineResult<ReindexOutcome> {
    let mut outcome = ReindexOutcome::default();
    let Ok(entries) = std::fs::read_dir(intel_root) else { return Ok(outcome) };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(slug) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else { continue };
        if store.get_intel_doc(&slug)?.is_some() {
            outcome.skipped.push(slug);
            continue;
        }
        let Ok(body) = std::fs::read_to_string(&path) else { continue };
        let fm = parse_frontmatter(&body);
        let rel = path
            .strip_prefix(intel_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let tags_json = serde_json::to_string(&fm.tags).unwrap_or_else(|_| "[]".to_string());
        let author = fm.author.as_deref().unwrap_or(default_author);
        store.add_intel_doc(&slug, &rel, &tags_json, None, author)?;
        for task_id in fm.linked_tasks {
            store.link_intel(&slug, "task", &task_id.to_string())?;
        }
        for req_id in fm.linked_reqs {
            store.link_intel(&slug, "requirement", &req_id.to_string())?;
        }
        outcome.registered.push(slug);
    }
    Ok(outcome)
}
