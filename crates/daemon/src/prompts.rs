// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt assembly ("Prompt assembly"): each prompt kind
//! concatenates provider guardrails, protocol fragments, an optional
//! history block, daemon rules + role/capability fragments, and the
//! role-specific body, soft-capped by a character budget.

use crate::contracts::load_doc;
use minion_core::AgentClass;
use minion_engine::comms::CheckInboxOutcome;
use minion_engine::poll::PollResult;
use std::path::Path;

const DEFAULT_MAX_PROMPT_CHARS: usize = 60_000;

fn max_prompt_chars(docs_dir: &Path) -> usize {
    crate::contracts::load_contract(docs_dir, "config-defaults")
        .and_then(|v| v.get("max_prompt_chars").and_then(|n| n.as_u64()))
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_MAX_PROMPT_CHARS)
}

fn provider_guardrails(docs_dir: &Path, provider: &str) -> Option<String> {
    load_doc(docs_dir, &format!("guardrails-{provider}.md"))
}

fn protocol_fragments(docs_dir: &Path, class: AgentClass) -> String {
    let mut out = String::new();
    if let Some(common) = load_doc(docs_dir, "protocol-common.md") {
        out.push_str(&common);
        out.push('\n');
    }
    if let Some(role) = load_doc(docs_dir, &format!("protocol-{}.md", class.as_str())) {
        out.push_str(&role);
        out.push('\n');
    }
    out
}

fn daemon_rules_and_role(docs_dir: &Path, class: AgentClass) -> String {
    let mut out = String::new();
    if let Some(rules) = load_doc(docs_dir, "daemon-rules.md") {
        out.push_str(&rules);
        out.push('\n');
    }
    if let Some(role) = load_doc(docs_dir, &format!("role-{}.md", class.as_str())) {
        out.push_str(&role);
        out.push('\n');
    }
    out
}

fn history_block(docs_dir: &Path, history: &[minion_engine::comms::InlinedMessage]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let header = load_doc(docs_dir, "history-header.md").unwrap_or_else(|| "## Recent history\n".to_string());
    let mut out = header;
    for m in history {
        out.push_str(&format!("\n--- from {} ---\n{}\n", m.message.from_agent, m.content));
    }
    Some(out)
}

fn assemble(
    docs_dir: &Path,
    provider: &str,
    class: AgentClass,
    history: Option<&str>,
    body: &str,
) -> String {
    let mut sections = Vec::new();
    if let Some(guardrails) = provider_guardrails(docs_dir, provider) {
        sections.push(guardrails);
    }
    sections.push(protocol_fragments(docs_dir, class));
    if let Some(history) = history {
        sections.push(history.to_string());
    }
    sections.push(daemon_rules_and_role(docs_dir, class));
    sections.push(body.to_string());

    let full = sections.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join("\n");
    let cap = max_prompt_chars(docs_dir);
    if full.chars().count() > cap {
        tracing::warn!(cap, len = full.chars().count(), "prompt exceeded budget, truncating");
        full.chars().take(cap).collect()
    } else {
        full
    }
}

/// Boot prompt: protocol + rules + role fragments + boot sequence + guardrails.
pub fn boot_prompt(docs_dir: &Path, provider: &str, class: AgentClass) -> String {
    let boot_sequence = load_doc(docs_dir, "boot-sequence.md")
        .unwrap_or_else(|| format!("You are {} ({class:?}). Begin your boot sequence: register, check inbox, then poll for work.", class.as_str()));
    assemble(docs_dir, provider, class, None, &boot_sequence)
}

/// Inbox prompt: inlines unread messages plus the claimable task summaries
/// a content poll returned.
pub fn inbox_prompt(
    docs_dir: &Path,
    provider: &str,
    class: AgentClass,
    poll: &PollResult,
    inject_history: Option<&[minion_engine::comms::InlinedMessage]>,
) -> String {
    let mut body = String::new();
    if let Some(CheckInboxOutcome { direct, broadcasts, staleness_warning, hp_reminder }) = &poll.messages {
        for m in direct {
            body.push_str(&format!("--- direct from {} ---\n{}\n\n", m.message.from_agent, m.content));
        }
        for m in broadcasts {
            body.push_str(&format!("--- broadcast from {} ---\n{}\n\n", m.message.from_agent, m.content));
        }
        if let Some(w) = staleness_warning {
            body.push_str(&format!("NOTE: {w}\n"));
        }
        if let Some(r) = hp_reminder {
            body.push_str(&format!("NOTE: {r}\n"));
        }
    }
    if !poll.tasks.is_empty() {
        body.push_str("\nClaimable tasks:\n");
        for t in &poll.tasks {
            body.push_str(&format!("- #{} [{}] {}\n", t.id, t.status, t.title));
        }
    }
    let history = inject_history.and_then(|h| history_block(docs_dir, h));
    assemble(docs_dir, provider, class, history.as_deref(), &body)
}

/// Watcher prompt: a single incoming message/interrupt notice.
pub fn watcher_prompt(docs_dir: &Path, provider: &str, class: AgentClass, message: &str) -> String {
    assemble(docs_dir, provider, class, None, message)
}
