// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HP accounting : cumulative + per-turn token counters,
//! the self-report sentinel (`hp_tokens_limit == 100`), threshold alerts
//! at 25%/10%, and the ≤5% phoenix-down cutoff the daemon runner acts on.

use crate::error::{EngineError, EngineResult};
use minion_core::AgentClass;
use minion_store::Store;
use std::path::Path;
use std::str::FromStr;

/// Thresholds checked in descending order; an alert fires the first time
/// `hp_pct` crosses below one going down.
const ALERT_THRESHOLDS: &[i64] = &[25, 10];
const ALERT_REARM_ABOVE: i64 = 50;
/// Phoenix-down cutoff — the daemon runner respawns at or below this.
pub const PHOENIX_DOWN_PCT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Health {
    Healthy,
    Wounded,
    Critical,
}

impl Health {
    fn from_pct(pct: i64) -> Self {
        if pct > 50 {
            Health::Healthy
        } else if pct > 25 {
            Health::Wounded
        } else {
            Health::Critical
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Health::Healthy => "Healthy",
            Health::Wounded => "Wounded",
            Health::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HpSummary {
    pub pct: i64,
    pub used_k: i64,
    pub limit_k: i64,
    pub health: Health,
}

impl HpSummary {
    pub fn render(&self) -> String {
        format!(
            "{}% HP [{}k/{}k] — {}",
            self.pct,
            self.used_k,
            self.limit_k,
            self.health.as_str()
        )
    }
}

/// Derive HP% from the agent row: prefer the per-turn counters, falling
/// back to cumulative when the turn counters are unset. A self-reported
/// `hp_tokens_limit == 100`  is `100 - used`, which
/// `hp_summary` renders verbatim without the usual token-count math.
pub fn hp_summary(agent: &minion_store::Agent) -> HpSummary {
    if agent.hp_tokens_limit == 100 {
        let pct = (100 - agent.hp_turn_input).clamp(0, 100);
        return HpSummary {
            pct,
            used_k: agent.hp_turn_input,
            limit_k: 100,
            health: Health::from_pct(pct),
        };
    }
    if agent.hp_tokens_limit <= 0 {
        return HpSummary {
            pct: 100,
            used_k: 0,
            limit_k: 0,
            health: Health::Healthy,
        };
    }
    let (used, limit) = if agent.hp_turn_input > 0 || agent.hp_turn_output > 0 {
        (agent.hp_turn_input + agent.hp_turn_output, agent.hp_tokens_limit)
    } else {
        (agent.hp_input_tokens + agent.hp_output_tokens, agent.hp_tokens_limit)
    };
    let pct = (100 - (used * 100 / limit)).clamp(0, 100);
    HpSummary {
        pct,
        used_k: used / 1000,
        limit_k: limit / 1000,
        health: Health::from_pct(pct),
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UpdateHpOutcome {
    pub summary: Option<HpSummary>,
    pub self_reported_noop: bool,
    pub alerts_fired: Vec<i64>,
}

/// `update-hp` — idempotent no-op when the agent's *current* row is
/// self-reported (`hp_tokens_limit == 100`), per the HP self-report
/// precedence invariant . Otherwise writes the raw counters and
/// evaluates threshold alerts.
#[allow(clippy::too_many_arguments)]
pub fn update_hp(
    store: &Store,
    work_dir: &Path,
    agent: &str,
    input_tokens: i64,
    output_tokens: i64,
    limit: i64,
    turn_input: i64,
    turn_output: i64,
) -> EngineResult<UpdateHpOutcome> {
    let before = store
        .get_agent(agent)?
        .ok_or_else(|| EngineError::blocked(format!("{agent} is not registered")))?;
    if before.hp_tokens_limit == 100 {
        return Ok(UpdateHpOutcome {
            self_reported_noop: true,
            ..Default::default()
        });
    }

    store.update_agent_hp(agent, input_tokens, output_tokens, limit, turn_input, turn_output)?;
    let after = store
        .get_agent(agent)?
        .ok_or_else(|| EngineError::Other("update_hp produced no row".to_string()))?;
    let summary = hp_summary(&after);

    let mut fired: Vec<i64> = serde_json::from_str(&after.hp_alerts_fired).unwrap_or_default();
    let rearmed = summary.pct > ALERT_REARM_ABOVE && !fired.is_empty();
    if rearmed {
        fired.clear();
    }
    let mut alerts_fired = Vec::new();
    for &threshold in ALERT_THRESHOLDS {
        if summary.pct <= threshold && !fired.contains(&threshold) {
            // Persist the threshold only once the alert send succeeds; a
            // failed send must leave `hp_alerts_fired` untouched so the
            // alert re-arms and retries on the next `update-hp` call.
            match notify_lead_threshold(store, work_dir, agent, &summary, threshold) {
                Ok(()) => {
                    fired.push(threshold);
                    alerts_fired.push(threshold);
                }
                Err(e) => {
                    tracing::warn!(agent, threshold, error = %e, "HP threshold alert send failed");
                }
            }
        }
    }
    if rearmed || !alerts_fired.is_empty() {
        let alerts_json = serde_json::to_string(&fired).unwrap_or_else(|_| "[]".to_string());
        store.set_hp_alerts_fired(agent, &alerts_json)?;
    }

    Ok(UpdateHpOutcome {
        summary: Some(summary),
        self_reported_noop: false,
        alerts_fired,
    })
}

fn notify_lead_threshold(
    store: &Store,
    work_dir: &Path,
    agent: &str,
    summary: &HpSummary,
    threshold: i64,
) -> EngineResult<()> {
    let lead = store
        .list_agents()?
        .into_iter()
        .find(|a| AgentClass::from_str(&a.class).ok() == Some(AgentClass::Lead));
    let Some(lead) = lead else { return Ok(()) };
    let body = format!(
        "{agent} crossed the {threshold}% HP threshold ({})",
        summary.render()
    );
    let now = minion_core::now_iso();
    let rel_path = format!("inbox/{}/{}-hp-alert-{agent}.md", lead.name, now.replace([':', '.'], "-"));
    minion_core::atomic_write(&work_dir.join(&rel_path), &body)?;
    store.insert_message(minion_store::NewMessage {
        from_agent: "hp-accounting",
        to_agent: &lead.name,
        content_file: &rel_path,
        is_cc: false,
        cc_original_to: None,
    })?;
    Ok(())
}

/// ≤5% HP — the daemon runner's cue to write `state=phoenix_down` and
/// respawn a fresh generation.
pub fn is_phoenix_down(pct: i64) -> bool {
    pct <= PHOENIX_DOWN_PCT
}
