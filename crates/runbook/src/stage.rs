// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single node in a [`crate::Flow`] DAG.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_next: Option<String>,
    /// Agent classes eligible to claim work at this stage. `None` means
    /// "current assignee continues".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<Vec<String>>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub parked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawns: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_template: Option<String>,
}

impl Stage {
    /// Names of the stages this one can name as a target, before they're
    /// checked against the flow's known stage set.
    pub fn declared_targets(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(n) = &self.next {
            out.push(("next", n.as_str()));
        }
        if let Some(n) = &self.fail {
            out.push(("fail", n.as_str()));
        }
        if let Some(n) = &self.alt_next {
            out.push(("alt_next", n.as_str()));
        }
        out
    }
}
