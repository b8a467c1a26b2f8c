// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema establishment and forward migration.
//!
//! Each migration is an idempotent `CREATE TABLE IF NOT EXISTS` / `ALTER
//! TABLE ... ADD COLUMN` batch, applied in a single transaction and recorded
//! in `schema_version` (one row per applied version, never rewritten).
//! Connection discipline: WAL mode, a 5s busy timeout, and foreign keys
//! on, applied fresh on every connection open.

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::path::Path;

/// One forward step. `sql` may contain multiple statements separated by `;`.
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: r#"
CREATE TABLE IF NOT EXISTS agents (
    name                TEXT PRIMARY KEY,
    class               TEXT NOT NULL,
    model               TEXT,
    description         TEXT,
    transport           TEXT NOT NULL DEFAULT 'terminal',
    crew                TEXT,
    registered_at       TEXT NOT NULL,
    last_seen           TEXT NOT NULL,
    last_inbox_check    TEXT,
    context_summary     TEXT,
    context_updated_at  TEXT,
    current_zone        TEXT,
    status              TEXT NOT NULL DEFAULT 'waiting for work',
    hp_input_tokens     INTEGER NOT NULL DEFAULT 0,
    hp_output_tokens    INTEGER NOT NULL DEFAULT 0,
    hp_tokens_limit     INTEGER NOT NULL DEFAULT 0,
    hp_turn_input       INTEGER NOT NULL DEFAULT 0,
    hp_turn_output      INTEGER NOT NULL DEFAULT 0,
    hp_updated_at       TEXT,
    hp_alerts_fired     TEXT NOT NULL DEFAULT '[]',
    session_id          TEXT,
    pid                 INTEGER,
    generation          INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    from_agent      TEXT NOT NULL,
    to_agent        TEXT NOT NULL,
    content_file    TEXT NOT NULL,
    is_cc           INTEGER NOT NULL DEFAULT 0,
    cc_original_to  TEXT,
    read_flag       INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_to ON messages(to_agent, read_flag);

CREATE TABLE IF NOT EXISTS broadcast_reads (
    agent       TEXT NOT NULL,
    message_id  INTEGER NOT NULL,
    read_at     TEXT NOT NULL,
    PRIMARY KEY (agent, message_id)
);

CREATE TABLE IF NOT EXISTS battle_plans (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    set_by      TEXT NOT NULL,
    plan_file   TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS raid_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    agent       TEXT NOT NULL,
    entry_file  TEXT NOT NULL,
    priority    TEXT NOT NULL DEFAULT 'normal',
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_claims (
    file_path   TEXT PRIMARY KEY,
    agent       TEXT NOT NULL,
    claimed_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS file_claim_waitlist (
    file_path   TEXT NOT NULL,
    agent       TEXT NOT NULL,
    added_at    TEXT NOT NULL,
    PRIMARY KEY (file_path, agent)
);

CREATE TABLE IF NOT EXISTS flags (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    set_by      TEXT NOT NULL,
    set_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS retire_markers (
    agent       TEXT PRIMARY KEY,
    set_at      TEXT NOT NULL,
    set_by      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS fenix_down_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    agent       TEXT NOT NULL,
    files       TEXT NOT NULL DEFAULT '[]',
    manifest    TEXT NOT NULL DEFAULT '',
    consumed    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agent_interrupt (
    agent       TEXT PRIMARY KEY,
    set_at      TEXT NOT NULL,
    set_by      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT NOT NULL,
    task_file       TEXT NOT NULL,
    project         TEXT,
    zone            TEXT,
    status          TEXT NOT NULL DEFAULT 'open',
    blocked_by      TEXT NOT NULL DEFAULT '',
    assigned_to     TEXT,
    created_by      TEXT NOT NULL,
    files           TEXT NOT NULL DEFAULT '',
    progress        TEXT,
    class_required  TEXT,
    flow_type       TEXT NOT NULL DEFAULT 'task',
    task_type       TEXT NOT NULL DEFAULT 'feature',
    activity_count  INTEGER NOT NULL DEFAULT 0,
    result_file     TEXT,
    requirement_id  INTEGER,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_assigned ON tasks(assigned_to, status);
CREATE INDEX IF NOT EXISTS idx_tasks_requirement ON tasks(requirement_id);

CREATE TABLE IF NOT EXISTS transition_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id       INTEGER NOT NULL,
    entity_type     TEXT NOT NULL,
    from_status     TEXT,
    to_status       TEXT NOT NULL,
    triggered_by    TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transition_entity ON transition_log(entity_type, entity_id);

CREATE TABLE IF NOT EXISTS requirements (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path       TEXT NOT NULL UNIQUE,
    origin          TEXT NOT NULL,
    stage           TEXT NOT NULL DEFAULT 'seed',
    flow_type       TEXT NOT NULL DEFAULT 'requirement',
    parent_id       INTEGER,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_requirements_parent ON requirements(parent_id);

CREATE TABLE IF NOT EXISTS invocation_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    agent           TEXT NOT NULL,
    pid             INTEGER,
    model           TEXT,
    generation      INTEGER NOT NULL DEFAULT 0,
    rss_bytes       INTEGER,
    tokens_in       INTEGER,
    tokens_out      INTEGER,
    exit_code       INTEGER,
    compacted       INTEGER NOT NULL DEFAULT 0,
    timed_out       INTEGER NOT NULL DEFAULT 0,
    interrupted     INTEGER NOT NULL DEFAULT 0,
    started_at      TEXT NOT NULL,
    ended_at        TEXT
);
CREATE INDEX IF NOT EXISTS idx_invocation_agent ON invocation_log(agent);

CREATE TABLE IF NOT EXISTS compaction_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    agent           TEXT NOT NULL,
    model           TEXT,
    pid             INTEGER,
    rss_pre         INTEGER,
    tokens_pre      INTEGER,
    tokens_post     INTEGER,
    generation      INTEGER NOT NULL DEFAULT 0,
    compacted_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS backlog_items (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_path       TEXT NOT NULL UNIQUE,
    item_type       TEXT NOT NULL,
    title           TEXT NOT NULL,
    priority        TEXT NOT NULL DEFAULT 'normal',
    status          TEXT NOT NULL DEFAULT 'open',
    source          TEXT,
    promoted_to     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS intel_docs (
    slug            TEXT PRIMARY KEY,
    doc_path        TEXT NOT NULL,
    tags            TEXT NOT NULL DEFAULT '[]',
    description     TEXT,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS intel_links (
    intel_slug      TEXT NOT NULL,
    entity_type     TEXT NOT NULL,
    entity_id       TEXT NOT NULL,
    PRIMARY KEY (intel_slug, entity_type, entity_id)
);
"#,
    },
];

pub(crate) fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Open {
                path: path.to_path_buf(),
                source: rusqlite::Error::ModuleError(e.to_string()),
            })?;
        }
    }
    let conn = Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(conn)
}

/// Establish or migrate the schema at `path`. Safe to call on every open —
/// already-applied versions are skipped.
pub fn ensure_schema(path: &Path) -> StoreResult<()> {
    let mut conn = open_connection(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );",
    )?;
    let applied: u32 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
        .unwrap_or(0);

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= applied {
            continue;
        }
        tx.execute_batch(migration.sql)
            .map_err(|e| StoreError::Migration(migration.version, e.to_string()))?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            [migration.version],
        )?;
        tracing::debug!(version = migration.version, "applied schema migration");
    }
    tx.commit()?;
    Ok(())
}
