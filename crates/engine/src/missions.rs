// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crew/missions resolver: parse a mission
//! YAML's required capabilities and crew roster into a minimum covering
//! class set and the eligible character list. Process spawn, pane layout,
//! and window placement are external.

use crate::error::{EngineError, EngineResult};
use minion_core::{AgentClass, Capability};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct MissionSpec {
    pub name: String,
    #[serde(default)]
    pub required_capabilities: Vec<Capability>,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

pub fn parse_mission(text: &str) -> EngineResult<MissionSpec> {
    serde_yaml::from_str(text).map_err(|e| EngineError::invalid(format!("malformed mission yaml: {e}")))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedAgent {
    pub name: String,
    pub class: AgentClass,
    pub provider: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedMission {
    pub name: String,
    /// The minimum set of classes whose union of capabilities covers
    /// `required_capabilities`.
    pub classes: BTreeSet<AgentClass>,
    /// Roster entries whose class is in `classes`.
    pub agents: Vec<ResolvedAgent>,
}

/// Greedy set cover over `AgentClass::ALL`: repeatedly picks the class
/// covering the most still-uncovered capabilities until none remain. Lead
/// is always included since it is the sole `manage` capability holder
/// other than planner, and the party always needs one.
fn minimum_covering_classes(required: &[Capability]) -> BTreeSet<AgentClass> {
    let mut remaining: BTreeSet<Capability> = required.iter().copied().collect();
    let mut chosen = BTreeSet::new();
    chosen.insert(AgentClass::Lead);
    for cap in AgentClass::Lead.capabilities() {
        remaining.remove(cap);
    }

    while !remaining.is_empty() {
        let best = AgentClass::ALL
            .into_iter()
            .filter(|c| !chosen.contains(c))
            .max_by_key(|c| c.capabilities().iter().filter(|cap| remaining.contains(cap)).count());
        match best {
            Some(class) if class.capabilities().iter().any(|cap| remaining.contains(cap)) => {
                for cap in class.capabilities() {
                    remaining.remove(cap);
                }
                chosen.insert(class);
            }
            _ => break,
        }
    }
    chosen
}

/// Resolve a parsed mission into its covering class set and the eligible
/// roster entries. Pure data transform — no registration or process spawn.
pub fn resolve(mission: &MissionSpec) -> EngineResult<ResolvedMission> {
    let classes = minimum_covering_classes(&mission.required_capabilities);
    let mut agents = Vec::new();
    for entry in &mission.roster {
        let class = AgentClass::from_str(&entry.class)
            .map_err(|_| EngineError::invalid(format!("unknown class {} in roster", entry.class)))?;
        if classes.contains(&class) {
            agents.push(ResolvedAgent {
                name: entry.name.clone(),
                class,
                provider: entry.provider.clone(),
                model: entry.model.clone(),
            });
        }
    }
    Ok(ResolvedMission {
        name: mission.name.clone(),
        classes,
        agents,
    })
}
