// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Comms core: register / send / check-inbox / history / purge, plus the
//! `rename` and self-report HP sentinel features.

use crate::error::{EngineError, EngineResult};
use minion_core::{scan_triggers, AgentClass};
use minion_store::{Agent, Message, NewMessage, RegisterInput, Store, BROADCAST_RECIPIENT};
use std::path::Path;
use std::str::FromStr;

const KNOWN_TRANSPORTS: &[&str] = &["terminal", "daemon", "daemon-ts"];
const STALE_BROADCAST_DISMISS_SECONDS: i64 = 3600;
const LARGE_MESSAGE_CHARS: usize = 500;

fn slugify(raw: &str) -> String {
    let mut out = String::new();
    let mut last_dash = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "msg".to_string()
    } else {
        out.chars().take(40).collect()
    }
}

fn current_lead(store: &Store) -> EngineResult<Option<Agent>> {
    Ok(store
        .list_agents()?
        .into_iter()
        .find(|a| a.class == AgentClass::Lead.as_str()))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RegisterOutcome {
    pub agent: Agent,
    pub onboarding: Option<String>,
    pub playbook: Vec<String>,
    pub codebook: String,
    pub dismissed_broadcasts: u64,
}

/// Registers an agent or, if the name already exists, updates its class,
/// model, description, transport, and crew in place.
pub fn register(
    store: &Store,
    docs_dir: &Path,
    name: &str,
    class: &str,
    model: Option<&str>,
    description: Option<&str>,
    transport: &str,
    crew: Option<&str>,
) -> EngineResult<RegisterOutcome> {
    let class_enum = AgentClass::from_str(class)
        .map_err(|e| EngineError::invalid(format!("class {:?}: {e}", class)))?;
    if !KNOWN_TRANSPORTS.contains(&transport) {
        return Err(EngineError::invalid(format!("transport {transport:?}")));
    }
    if let Some(m) = model {
        if !class_enum.allows_model(m) {
            return Err(EngineError::invalid(format!(
                "model {m:?} is not in the {class} class's model whitelist"
            )));
        }
    }

    let agent = store.register_agent(RegisterInput {
        name,
        class,
        model,
        description,
        transport,
        crew,
    })?;
    store.clear_retire_marker(name)?;

    let cutoff = minion_core::iso_minus_seconds(STALE_BROADCAST_DISMISS_SECONDS);
    let stale = store.stale_unread_broadcasts(name, &cutoff)?;
    for msg in &stale {
        store.mark_broadcast_read(name, msg.id)?;
    }

    let onboarding_path = docs_dir.join("onboarding").join(format!("{class}.md"));
    let onboarding = std::fs::read_to_string(&onboarding_path).ok();

    let playbook = match transport {
        "terminal" => vec![
            "Read your onboarding brief and briefing files.".to_string(),
            "Call `minion poll --agent <you>` to block for work.".to_string(),
            "On content, act, then poll again.".to_string(),
        ],
        _ => vec![
            "Call `minion check-inbox` before your first `send`.".to_string(),
            "Respect inbox discipline: consume unread mail before sending.".to_string(),
        ],
    };

    Ok(RegisterOutcome {
        agent,
        onboarding,
        playbook,
        codebook: minion_core::format_trigger_codebook(),
        dismissed_broadcasts: stale.len() as u64,
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SendOutcome {
    pub message: Message,
    pub cc: Vec<Message>,
    pub triggers: Vec<&'static str>,
    pub reminders: Vec<String>,
}

/// Unread-inbox and staleness gating are hard BLOCKED preconditions on
/// sending: a sender must clear their own inbox and hold fresh context
/// before a message goes out.
pub fn send(
    store: &Store,
    work_dir: &Path,
    from: &str,
    to: &str,
    body: &str,
    cc: &str,
) -> EngineResult<SendOutcome> {
    let preexisting = store.get_agent(from)?;

    // Staleness is checked against whatever row existed *before* this call:
    // a never-registered sender has no context to go stale, so it is
    // exempt on this first message. Only after that check do we upsert the
    // row, matching the original's `staleness_check` (exempts a row that
    // doesn't exist yet) running before its `INSERT OR IGNORE`.
    if let Some(sender) = &preexisting {
        let class = AgentClass::from_str(&sender.class)
            .map_err(|e| EngineError::invalid(format!("sender class {e}")))?;
        if let Some(updated) = sender.context_updated_at.as_deref() {
            if let Some(age) = minion_core::seconds_since(updated) {
                if age as u64 > class.staleness_seconds() {
                    return Err(EngineError::blocked(format!(
                        "{from}'s context is stale ({age}s, threshold {}s)",
                        class.staleness_seconds()
                    )));
                }
            }
        } else {
            return Err(EngineError::blocked(format!("{from} has no recorded context")));
        }
    }

    let sender = match preexisting {
        Some(a) => a,
        None => {
            // Supplemented feature 6: auto-register unknown senders as coder.
            store.register_agent(RegisterInput {
                name: from,
                class: AgentClass::Coder.as_str(),
                model: None,
                description: None,
                transport: "terminal",
                crew: None,
            })?
        }
    };

    let unread_direct = store.unread_direct_count(from)?;
    let unread_broadcast = store.unread_broadcast_count(from)?;
    if unread_direct + unread_broadcast > 0 {
        return Err(EngineError::blocked(format!(
            "{from} has {unread_direct} unread direct and {unread_broadcast} unread broadcast message(s)"
        )));
    }
    if store.active_battle_plan()?.is_none() {
        return Err(EngineError::blocked("no active battle plan"));
    }

    let resolved_to = if to == "broadcast" { BROADCAST_RECIPIENT } else { to };

    let now = minion_core::now_iso();
    let from_slug = slugify(from);
    let body_slug = slugify(body.lines().next().unwrap_or(body));

    let message = write_and_insert(store, work_dir, from, resolved_to, &now, &from_slug, &body_slug, body, false, None)?;

    let lead = current_lead(store)?;
    let mut cc_names: Vec<String> = cc
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(lead) = &lead {
        let is_lead_party = from == lead.name || resolved_to == lead.name;
        if !is_lead_party && !cc_names.iter().any(|n| n == &lead.name) {
            cc_names.push(lead.name.clone());
        }
    }

    let mut cc_messages = Vec::new();
    for cc_to in &cc_names {
        let cc_msg = write_and_insert(
            store, work_dir, from, cc_to, &now, &from_slug, &body_slug, body, true, Some(resolved_to),
        )?;
        cc_messages.push(cc_msg);
    }

    let triggers = scan_triggers(body);
    if triggers.iter().any(|w| *w == minion_store::FLAG_MOON_CRASH) {
        store.set_flag(minion_store::FLAG_MOON_CRASH, "1", from)?;
    }
    if triggers.iter().any(|w| *w == minion_store::FLAG_STAND_DOWN) {
        store.set_flag(minion_store::FLAG_STAND_DOWN, "1", from)?;
    }

    let mut reminders = Vec::new();
    if body.chars().count() > LARGE_MESSAGE_CHARS && !body.contains('/') {
        reminders.push(
            "message is long and doesn't look like it references a file path; consider writing the \
             artifact to a file and referencing it by path"
                .to_string(),
        );
    }
    if resolved_to != BROADCAST_RECIPIENT {
        let has_open_task = !store.tasks_assigned_to(resolved_to)?.is_empty();
        if !has_open_task {
            if let Some(lead) = &lead {
                if from == lead.name {
                    reminders.push(format!("{resolved_to} has no open task assigned"));
                }
            }
        }
    }
    if sender.transport == "terminal" {
        reminders.push("terminal transport: restart polling as a background task after this turn".to_string());
    }

    Ok(SendOutcome {
        message,
        cc: cc_messages,
        triggers,
        reminders,
    })
}

#[allow(clippy::too_many_arguments)]
fn write_and_insert(
    store: &Store,
    work_dir: &Path,
    from: &str,
    to: &str,
    ts: &str,
    from_slug: &str,
    body_slug: &str,
    body: &str,
    is_cc: bool,
    cc_original_to: Option<&str>,
) -> EngineResult<Message> {
    let filename = format!("{ts}-{from_slug}-{body_slug}.md");
    let rel_path = format!("inbox/{to}/{filename}");
    let abs_path = work_dir.join(&rel_path);
    minion_core::atomic_write(&abs_path, body)?;
    store
        .insert_message(NewMessage {
            from_agent: from,
            to_agent: to,
            content_file: &rel_path,
            is_cc,
            cc_original_to,
        })
        .map_err(Into::into)
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct InlinedMessage {
    pub message: Message,
    pub content: String,
}

fn inline(work_dir: &Path, message: Message) -> InlinedMessage {
    let content = std::fs::read_to_string(work_dir.join(&message.content_file))
        .unwrap_or_else(|_| String::new());
    InlinedMessage { message, content }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckInboxOutcome {
    pub direct: Vec<InlinedMessage>,
    pub broadcasts: Vec<InlinedMessage>,
    pub staleness_warning: Option<String>,
    pub hp_reminder: Option<String>,
}

/// Returns the agent's unread direct and broadcast messages, marking them read.
pub fn check_inbox(store: &Store, work_dir: &Path, agent: &str) -> EngineResult<CheckInboxOutcome> {
    let agent_row = store
        .get_agent(agent)?
        .ok_or_else(|| EngineError::blocked(format!("{agent} is not registered")))?;
    store.touch_inbox_check(agent)?;

    let direct_rows = store.unread_direct(agent)?;
    for m in &direct_rows {
        store.mark_direct_read(m.id)?;
    }
    let broadcast_rows = store.unread_broadcasts(agent)?;
    for m in &broadcast_rows {
        store.mark_broadcast_read(agent, m.id)?;
    }

    let mut direct: Vec<InlinedMessage> = direct_rows.into_iter().map(|m| inline(work_dir, m)).collect();
    direct.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
    let mut broadcasts: Vec<InlinedMessage> =
        broadcast_rows.into_iter().map(|m| inline(work_dir, m)).collect();
    broadcasts.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));

    let class = AgentClass::from_str(&agent_row.class).ok();
    let staleness_warning = agent_row.context_updated_at.as_deref().and_then(|updated| {
        let age = minion_core::seconds_since(updated)?;
        let threshold = class.map(AgentClass::staleness_seconds).unwrap_or(300) as i64;
        (age > threshold).then(|| format!("context is {age}s old, threshold is {threshold}s"))
    });

    let hp_reminder = (agent_row.transport == "terminal" && agent_row.hp_updated_at.is_none())
        .then(|| "HP unknown; report with `minion set-context --hp <pct>`".to_string());

    Ok(CheckInboxOutcome {
        direct,
        broadcasts,
        staleness_warning,
        hp_reminder,
    })
}

/// `history(agent, limit)` — oldest first, content inlined.
pub fn history(store: &Store, work_dir: &Path, agent: &str, limit: i64) -> EngineResult<Vec<InlinedMessage>> {
    Ok(store
        .history(agent, limit)?
        .into_iter()
        .map(|m| inline(work_dir, m))
        .collect())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PurgeOutcome {
    pub direct_deleted: u64,
    pub broadcasts_marked_read: u64,
    pub orphan_reads_deleted: u64,
}

/// Deletes read direct messages and broadcast receipts for `agent` older
/// than the cutoff.
pub fn purge(store: &Store, agent: &str, older_than_hours: i64) -> EngineResult<PurgeOutcome> {
    let cutoff = minion_core::iso_minus_seconds(older_than_hours * 3600);
    let direct_deleted = store.purge_direct_older_than(agent, &cutoff)?;
    let broadcasts_marked_read = store.purge_mark_broadcasts_read(agent, &cutoff)?;
    let orphan_reads_deleted = store.purge_orphan_broadcast_reads()?;
    Ok(PurgeOutcome {
        direct_deleted,
        broadcasts_marked_read,
        orphan_reads_deleted,
    })
}

/// Lead-only zone reassignment.
pub fn rename(store: &Store, old: &str, new: &str) -> EngineResult<Agent> {
    if store.get_agent(old)?.is_none() {
        return Err(EngineError::blocked(format!("{old} is not registered")));
    }
    if store.get_agent(new)?.is_some() {
        return Err(EngineError::invalid(format!("{new} is already registered")));
    }
    store.rename_agent(old, new)?;
    store
        .get_agent(new)?
        .ok_or_else(|| EngineError::Other("rename produced no row".to_string()))
}

pub fn set_status(store: &Store, agent: &str, status: &str) -> EngineResult<()> {
    if store.get_agent(agent)?.is_none() {
        return Err(EngineError::blocked(format!("{agent} is not registered")));
    }
    store.set_agent_status(agent, status)?;
    Ok(())
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SetContextOutcome {
    pub claim_warning: Option<String>,
}

/// `set-context` — also covers the self-report HP sentinel and the
/// unclaimed-file edit warning.
pub fn set_context(
    store: &Store,
    agent: &str,
    summary: Option<&str>,
    hp_percent: Option<i64>,
    files_modified: &[String],
) -> EngineResult<SetContextOutcome> {
    if store.get_agent(agent)?.is_none() {
        return Err(EngineError::blocked(format!("{agent} is not registered")));
    }
    if let Some(summary) = summary {
        store.set_agent_context(agent, summary)?;
    } else {
        store.touch_context_updated(agent)?;
    }

    if let Some(hp) = hp_percent {
        let turn_input = std::cmp::max(1, 100 - hp);
        store.update_agent_hp(agent, turn_input, 0, 100, turn_input, 0)?;
    }

    let mut unclaimed = Vec::new();
    for file in files_modified {
        match store.get_claim(file)? {
            Some(claim) if claim.agent == agent => {}
            _ => unclaimed.push(file.clone()),
        }
    }
    let claim_warning = (!unclaimed.is_empty()).then(|| {
        let commands: Vec<String> = unclaimed.iter().map(|f| format!("minion claim-file {f}")).collect();
        format!(
            "edited without holding the claim: {} — run: {}",
            unclaimed.join(", "),
            commands.join("; ")
        )
    });

    Ok(SetContextOutcome { claim_warning })
}
