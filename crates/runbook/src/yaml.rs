// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw YAML schema for a flow file, and the validation pass run once a
//! flow's `inherits` chain has been fully resolved.

use crate::error::{FlowError, FlowResult};
use crate::flow::Flow;
use crate::stage::Stage;
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RawStage {
    pub description: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub fail: Option<String>,
    #[serde(default)]
    pub alt_next: Option<String>,
    #[serde(default)]
    pub workers: Option<Vec<String>>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub parked: bool,
    #[serde(default)]
    pub spawns: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub context_template: Option<String>,
}

impl RawStage {
    fn into_stage(self, name: String) -> Stage {
        Stage {
            name,
            description: self.description,
            next: self.next,
            fail: self.fail,
            alt_next: self.alt_next,
            workers: self.workers,
            requires: self.requires,
            terminal: self.terminal,
            skip: self.skip,
            parked: self.parked,
            spawns: self.spawns,
            protocol: self.protocol,
            context: self.context,
            context_template: self.context_template,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFlow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub stages: IndexMap<String, RawStage>,
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub dead_ends: Vec<String>,
    /// Reserved for future shortcut aliases; parsed but unused.
    #[serde(default)]
    pub shortcuts: serde_yaml::Value,
}

pub fn parse_raw(flow_name: &str, text: &str) -> FlowResult<RawFlow> {
    serde_yaml::from_str(text).map_err(|e| FlowError::InvalidYaml {
        flow: flow_name.to_string(),
        reason: e.to_string(),
    })
}

/// Merge `child`'s stage map over `parent_stages` (full per-key override,
/// not a field-level merge) and union the `dead_ends` lists.
pub fn merge_inherited(
    child: &RawFlow,
    parent_stages: IndexMap<String, RawStage>,
    parent_dead_ends: &[String],
) -> (IndexMap<String, RawStage>, Vec<String>) {
    let mut stages = parent_stages;
    for (name, stage) in &child.stages {
        stages.insert(name.clone(), stage.clone());
    }
    let mut dead_ends = parent_dead_ends.to_vec();
    for d in &child.dead_ends {
        if !dead_ends.contains(d) {
            dead_ends.push(d.clone());
        }
    }
    (stages, dead_ends)
}

pub fn build_flow(raw: RawFlow, stages: IndexMap<String, RawStage>, dead_ends: Vec<String>) -> FlowResult<Flow> {
    let resolved: IndexMap<String, Stage> = stages
        .into_iter()
        .map(|(name, raw_stage)| {
            let stage = raw_stage.into_stage(name.clone());
            (name, stage)
        })
        .collect();

    let flow = Flow {
        name: raw.name.clone(),
        description: raw.description,
        stages: resolved,
        dead_ends,
    };
    validate(&flow)?;
    Ok(flow)
}

fn validate(flow: &Flow) -> FlowResult<()> {
    for (stage_name, stage) in &flow.stages {
        for (field, target) in stage.declared_targets() {
            if !flow.stages.contains_key(target) {
                return Err(FlowError::DanglingReference {
                    flow: flow.name.clone(),
                    stage: stage_name.clone(),
                    field,
                    target: target.to_string(),
                });
            }
        }
    }
    for dead_end in &flow.dead_ends {
        if !flow.stages.contains_key(dead_end) {
            return Err(FlowError::DanglingReference {
                flow: flow.name.clone(),
                stage: "<dead_ends>".to_string(),
                field: "dead_ends",
                target: dead_end.clone(),
            });
        }
    }
    Ok(())
}
