// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent classes, capabilities, and the staleness thresholds enforced on `send`.
//!
//! This is the hardcoded fallback registry; a future `agent-classes.yaml`
//! override is intentionally out of scope for now.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One of the seven fixed crew roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentClass {
    Lead,
    Coder,
    Builder,
    Oracle,
    Recon,
    Planner,
    Auditor,
}

impl AgentClass {
    pub const ALL: [AgentClass; 7] = [
        AgentClass::Lead,
        AgentClass::Coder,
        AgentClass::Builder,
        AgentClass::Oracle,
        AgentClass::Recon,
        AgentClass::Planner,
        AgentClass::Auditor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentClass::Lead => "lead",
            AgentClass::Coder => "coder",
            AgentClass::Builder => "builder",
            AgentClass::Oracle => "oracle",
            AgentClass::Recon => "recon",
            AgentClass::Planner => "planner",
            AgentClass::Auditor => "auditor",
        }
    }

    /// Seconds of context staleness tolerated before `send` is blocked.
    pub fn staleness_seconds(self) -> u64 {
        match self {
            AgentClass::Coder | AgentClass::Builder | AgentClass::Recon | AgentClass::Auditor => {
                300
            }
            AgentClass::Lead | AgentClass::Planner => 900,
            AgentClass::Oracle => 1800,
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            AgentClass::Lead => &[Manage, Plan, Monitor, Review],
            AgentClass::Coder => &[Code],
            AgentClass::Builder => &[Build, Code],
            AgentClass::Oracle => &[Review, Investigate, Memory],
            AgentClass::Recon => &[Investigate],
            AgentClass::Planner => &[Plan, Manage],
            AgentClass::Auditor => &[Review, Test],
        }
    }

    pub fn has_capability(self, cap: Capability) -> bool {
        self.capabilities().contains(&cap)
    }

    /// Model ids this class may register with. `register`'s
    /// "model not in class whitelist" rejection is checked against this set
    /// whenever a caller supplies an explicit `--model`.
    pub fn model_whitelist(self) -> &'static [&'static str] {
        match self {
            AgentClass::Lead | AgentClass::Planner | AgentClass::Oracle => &["opus", "sonnet"],
            AgentClass::Coder | AgentClass::Builder | AgentClass::Recon | AgentClass::Auditor => {
                &["sonnet", "haiku"]
            }
        }
    }

    pub fn allows_model(self, model: &str) -> bool {
        self.model_whitelist().contains(&model)
    }

    /// Briefing files read during `cold-start` onboarding, relative to the project work dir.
    pub fn briefing_files(self) -> &'static [&'static str] {
        match self {
            AgentClass::Lead => &[".work/CODE_MAP.md", ".work/CODE_OWNERS.md", ".work/traps/"],
            AgentClass::Coder => &[".work/CODE_MAP.md", ".work/traps/"],
            AgentClass::Builder => &[".work/CODE_MAP.md", ".work/traps/"],
            AgentClass::Oracle => &[
                ".work/CODE_MAP.md",
                ".work/CODE_OWNERS.md",
                ".work/intel/",
                ".work/traps/",
            ],
            AgentClass::Recon => &[".work/CODE_MAP.md", ".work/intel/", ".work/traps/"],
            AgentClass::Planner => &[".work/CODE_MAP.md", ".work/CODE_OWNERS.md", ".work/traps/"],
            AgentClass::Auditor => &[".work/CODE_MAP.md", ".work/traps/"],
        }
    }

    /// Classes whose flow stages grant them the given capability, e.g. for
    /// picking eligible reviewers in the P3/P4 polling tiers.
    pub fn classes_with(cap: Capability) -> BTreeSet<AgentClass> {
        AgentClass::ALL
            .into_iter()
            .filter(|c| c.has_capability(cap))
            .collect()
    }
}

impl fmt::Display for AgentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown agent class {0:?}")]
pub struct UnknownClass(pub String);

impl FromStr for AgentClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(AgentClass::Lead),
            "coder" => Ok(AgentClass::Coder),
            "builder" => Ok(AgentClass::Builder),
            "oracle" => Ok(AgentClass::Oracle),
            "recon" => Ok(AgentClass::Recon),
            "planner" => Ok(AgentClass::Planner),
            "auditor" => Ok(AgentClass::Auditor),
            other => Err(UnknownClass(other.to_string())),
        }
    }
}

/// A class capability, used both for flow `class_required` matching and the
/// P3/P4 reviewer-handoff polling tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Manage,
    Code,
    Build,
    Review,
    Test,
    Investigate,
    Plan,
    Monitor,
    Memory,
    Engineer,
}

/// Task lifecycle statuses recognized by the flow engine and gate checks.
pub const TASK_STATUSES: &[&str] = &[
    "open",
    "assigned",
    "in_progress",
    "fixed",
    "verified",
    "blocked",
    "closed",
    "abandoned",
    "stale",
    "obsolete",
    "completed",
];

/// Statuses a task may be in that count as "done" for requirement rollup and
/// `blocked_by` gate checks.
pub const TASK_TERMINAL_STATUSES: &[&str] = &["closed", "abandoned", "obsolete", "completed"];

pub const BATTLE_PLAN_STATUSES: &[&str] =
    &["active", "superseded", "completed", "abandoned", "obsolete"];

pub const RAID_LOG_PRIORITIES: &[&str] = &["low", "normal", "high", "critical"];

#[cfg(test)]
#[path = "classes_tests.rs"]
mod tests;
