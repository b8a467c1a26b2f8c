// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! minion-core: identifiers, classes, paths, and timestamp/filesystem
//! primitives shared by every other crate in the workspace.

pub mod classes;
pub mod fsutil;
pub mod id;
pub mod paths;
pub mod time_fmt;
pub mod time_iso;
pub mod trigger;

pub use classes::{
    AgentClass, Capability, UnknownClass, BATTLE_PLAN_STATUSES, RAID_LOG_PRIORITIES,
    TASK_STATUSES, TASK_TERMINAL_STATUSES,
};
pub use fsutil::{atomic_write, FsError};
pub use id::{IdGen, ShortId, UuidIdGen};
pub use paths::{
    resolve_db_path, resolve_docs_dir, resolve_path, resolve_swarm_runtime_dir, resolve_work_dir,
    reset_db_path, ENV_CLASS, ENV_DB_PATH, ENV_DOCS_DIR, ENV_FLOWS_DIR, ENV_MISSIONS_DIR,
    ENV_PROJECT,
};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
pub use time_iso::{iso_minus_seconds, now_iso, parse_iso, seconds_since, TimestampError};
pub use trigger::{format_trigger_codebook, scan_triggers, TRIGGER_WORDS};

crate::define_id! {
    /// Name of a registered agent — the primary key of the `agents` table.
    /// Agents are identified by name, not a generated id.
    pub struct AgentName;
}

crate::define_id! {
    /// Identifier of a requirement, derived from its file path under `reqs/`.
    pub struct RequirementId;
}

/// Identifier of a task row — the `tasks.id` autoincrement primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
