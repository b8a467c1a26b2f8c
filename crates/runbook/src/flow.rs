// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The resolved, validated, in-memory DAG. Pure data plus pure queries — no
//! I/O and no DB access lives here.

use crate::stage::Stage;
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct Flow {
    pub name: String,
    pub description: String,
    pub stages: IndexMap<String, Stage>,
    pub dead_ends: Vec<String>,
}

impl Flow {
    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    pub fn is_terminal(&self, stage: &str) -> bool {
        self.stages.get(stage).map(|s| s.terminal).unwrap_or(false)
    }

    pub fn is_parked(&self, stage: &str) -> bool {
        self.stages.get(stage).map(|s| s.parked).unwrap_or(false)
    }

    /// `{next, fail, alt_next} ∩ known`, with terminal/dead-end stages
    /// excluded as reachable *current* positions rather than as targets —
    /// a terminal stage simply declares no `next`/`fail` of its own.
    pub fn valid_transitions(&self, current: &str) -> BTreeSet<String> {
        let Some(stage) = self.stages.get(current) else {
            return BTreeSet::new();
        };
        stage
            .declared_targets()
            .into_iter()
            .map(|(_, target)| target.to_string())
            .filter(|target| self.stages.contains_key(target))
            .collect()
    }

    /// `next` on pass, `fail` on fail, `None` if the relevant field is unset.
    pub fn next_status(&self, current: &str, passed: bool) -> Option<String> {
        let stage = self.stages.get(current)?;
        if passed {
            stage.next.clone()
        } else {
            stage.fail.clone()
        }
    }

    /// Eligible worker classes for `stage`, or `None` if the current
    /// assignee should continue (no `workers` list declared).
    pub fn workers_for(&self, stage: &str) -> Option<Vec<String>> {
        self.stages.get(stage).and_then(|s| s.workers.clone())
    }

    /// Render the DAG as an ASCII outline with a `*` cursor at `current`.
    pub fn render_dag(&self, current: &str) -> String {
        let mut out = format!("flow: {} ({})\n", self.name, self.description);
        for (name, stage) in &self.stages {
            let cursor = if name == current { "*" } else { " " };
            out.push_str(&format!("{cursor} {name:<16} {}\n", stage.description));
            if let Some(next) = &stage.next {
                out.push_str(&format!("      -> {next} (pass)\n"));
            }
            if let Some(fail) = &stage.fail {
                out.push_str(&format!("      -> {fail} (fail)\n"));
            }
            if let Some(alt) = &stage.alt_next {
                out.push_str(&format!("      -> {alt} (alt)\n"));
            }
        }
        out
    }
}
