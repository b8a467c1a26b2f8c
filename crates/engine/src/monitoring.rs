// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only fused snapshots : `party_status`, `sitrep`,
//! `check_activity`, `check_freshness`. Pure reads over the Store plus
//! filesystem `mtime` inspection — no writes.

use crate::error::EngineResult;
use minion_core::AgentClass;
use minion_store::{Agent, BattlePlan, FileClaim, Message, Store, Task};
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;

const ACTIVE_CUTOFF_SECS: i64 = 300;
const POSSIBLY_DEAD_CUTOFF_SECS: i64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Judgment {
    Active,
    Idle,
    PossiblyDead,
}

impl Judgment {
    pub fn as_str(self) -> &'static str {
        match self {
            Judgment::Active => "active",
            Judgment::Idle => "idle",
            Judgment::PossiblyDead => "possibly dead",
        }
    }

    fn from_age(age_secs: Option<i64>) -> Self {
        match age_secs {
            Some(age) if age <= ACTIVE_CUTOFF_SECS => Judgment::Active,
            Some(age) if age <= POSSIBLY_DEAD_CUTOFF_SECS => Judgment::Idle,
            Some(_) => Judgment::PossiblyDead,
            // No timestamp evidence at all is treated as the worst case.
            None => Judgment::PossiblyDead,
        }
    }
}

fn file_mtime_age_secs(path: &Path) -> Option<i64> {
    let mtime = std::fs::metadata(path).ok()?.modified().ok()?;
    let elapsed = SystemTime::now().duration_since(mtime).ok()?;
    Some(elapsed.as_secs() as i64)
}

/// The freshest of (claimed-file mtimes, zone-dir mtime, last_seen, most
/// recent task update) against the 5-/15-minute cutoffs.
pub fn check_activity(store: &Store, work_dir: &Path, agent: &Agent) -> EngineResult<Judgment> {
    let mut youngest: Option<i64> = minion_core::seconds_since(&agent.last_seen);

    for claim in store.list_claims()? {
        if claim.agent != agent.name {
            continue;
        }
        if let Some(age) = file_mtime_age_secs(&work_dir.join(&claim.file_path)) {
            youngest = Some(youngest.map_or(age, |y| y.min(age)));
        }
    }

    if let Some(zone) = &agent.current_zone {
        if let Some(age) = file_mtime_age_secs(&work_dir.join(zone)) {
            youngest = Some(youngest.map_or(age, |y| y.min(age)));
        }
    }

    for task in store.tasks_assigned_to(&agent.name)? {
        if let Some(age) = minion_core::seconds_since(&task.updated_at) {
            youngest = Some(youngest.map_or(age, |y| y.min(age)));
        }
    }

    Ok(Judgment::from_age(youngest))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FreshnessReport {
    pub context_age_secs: Option<i64>,
    pub threshold_secs: i64,
    pub stale: bool,
}

/// Context-staleness read: the same threshold `check-inbox`/`send` enforce
/// , surfaced here as its own query rather than a side effect.
pub fn check_freshness(agent: &Agent) -> FreshnessReport {
    let threshold = AgentClass::from_str(&agent.class)
        .map(AgentClass::staleness_seconds)
        .unwrap_or(300) as i64;
    let age = agent.context_updated_at.as_deref().and_then(minion_core::seconds_since);
    FreshnessReport {
        stale: age.map(|a| a > threshold).unwrap_or(true),
        context_age_secs: age,
        threshold_secs: threshold,
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentStatus {
    pub agent: Agent,
    pub judgment: Judgment,
    pub freshness: FreshnessReport,
}

/// `party_status` — every registered agent with its activity judgment and
/// context freshness.
pub fn party_status(store: &Store, work_dir: &Path) -> EngineResult<Vec<AgentStatus>> {
    let mut out = Vec::new();
    for agent in store.list_agents()? {
        let judgment = check_activity(store, work_dir, &agent)?;
        let freshness = check_freshness(&agent);
        out.push(AgentStatus {
            agent,
            judgment,
            freshness,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Sitrep {
    pub agents: Vec<AgentStatus>,
    pub active_tasks: Vec<Task>,
    pub file_claims: Vec<FileClaim>,
    pub moon_crash: bool,
    pub stand_down: bool,
    pub recent_messages: Vec<Message>,
    pub battle_plan: Option<BattlePlan>,
}

/// `sitrep` — the full fused snapshot used by the lead to assess the party
/// : agents, active tasks, file claims, flags, recent comms,
/// battle plan.
pub fn sitrep(store: &Store, work_dir: &Path, recent_limit: i64) -> EngineResult<Sitrep> {
    let agents = party_status(store, work_dir)?;
    let active_tasks = store
        .list_tasks()?
        .into_iter()
        .filter(|t| !minion_core::TASK_TERMINAL_STATUSES.contains(&t.status.as_str()))
        .collect();
    let file_claims = store.list_claims()?;
    let moon_crash = store.flag_is_set(minion_store::FLAG_MOON_CRASH)?;
    let stand_down = store.flag_is_set(minion_store::FLAG_STAND_DOWN)?;
    let mut recent_messages = Vec::new();
    for agent in &agents {
        recent_messages.extend(store.history(&agent.agent.name, recent_limit)?);
    }
    recent_messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_messages.truncate(recent_limit.max(0) as usize);
    let battle_plan = store.active_battle_plan()?;

    Ok(Sitrep {
        agents,
        active_tasks,
        file_claims,
        moon_crash,
        stand_down,
        recent_messages,
        battle_plan,
    })
}
