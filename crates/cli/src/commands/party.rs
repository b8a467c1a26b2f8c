// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Party coordination surface : mission spawn, stand-down,
//! retirement, interrupt/resume, and zone hand-off. Process supervision
//! itself is the daemon runner's job — this crate only flips the DB flags,
//! retire markers, and interrupt rows that drive it.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;
use minion_daemon::config::{ENV_AGENT, ENV_MODEL, ENV_PROVIDER_BIN};

#[derive(Args)]
pub struct SpawnPartyArgs {
    /// Path to a mission YAML file
    mission_file: String,
    /// Skip launching `minion-agentd` supervisors; register only
    #[arg(long)]
    no_spawn: bool,
}

/// Resolves a mission (min-set-cover over required capabilities), registers
/// every resolved agent, clears `stand_down` and any stale retire markers,
/// then best-effort launches one `minion-agentd` supervisor per agent
///  wired to the same database and docs dir via env.
pub fn spawn_party(args: SpawnPartyArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    let text = match std::fs::read_to_string(&args.mission_file) {
        Ok(t) => t,
        Err(e) => output::fail(format!("Invalid mission file {}: {e}", args.mission_file)),
    };
    let spec = match minion_engine::missions::parse_mission(&text) {
        Ok(s) => s,
        Err(e) => output::fail(e),
    };
    let resolved = match minion_engine::missions::resolve(&spec) {
        Ok(r) => r,
        Err(e) => output::fail(e),
    };

    if let Err(e) = ctx.store.clear_flag(minion_store::FLAG_STAND_DOWN) {
        output::fail(e);
    }

    let db_path = minion_core::resolve_db_path();
    let mut registered = Vec::new();
    for agent in &resolved.agents {
        if let Err(e) = ctx.store.clear_retire_marker(&agent.name) {
            output::fail(e);
        }
        let outcome = match minion_engine::comms::register(
            &ctx.store,
            &ctx.docs_dir,
            &agent.name,
            agent.class.as_str(),
            agent.model.as_deref(),
            None,
            "terminal",
            None,
        ) {
            Ok(outcome) => outcome,
            Err(e) => output::fail(e),
        };

        if !args.no_spawn {
            spawn_agentd(agent, &db_path, &ctx.docs_dir);
        }
        registered.push(outcome);
    }

    output::succeed(&registered, format, None);
}

/// Best-effort launch of a detached `minion-agentd` supervisor. A failure
/// to spawn (binary not on `PATH`, etc.) is logged and does not fail the
/// overall party spawn — the roster is still registered and pollable.
fn spawn_agentd(agent: &minion_engine::missions::ResolvedAgent, db_path: &std::path::Path, docs_dir: &std::path::Path) {
    let mut cmd = std::process::Command::new("minion-agentd");
    cmd.env(ENV_AGENT, &agent.name)
        .env(minion_core::ENV_DB_PATH, db_path)
        .env(minion_core::ENV_DOCS_DIR, docs_dir);
    if let Some(provider) = &agent.provider {
        cmd.env(ENV_PROVIDER_BIN, provider);
    }
    if let Some(model) = &agent.model {
        cmd.env(ENV_MODEL, model);
    }
    match cmd.spawn() {
        Ok(_) => tracing::info!(agent = %agent.name, "spawned minion-agentd"),
        Err(e) => tracing::warn!(agent = %agent.name, error = %e, "failed to spawn minion-agentd"),
    }
}

/// Sets the session-wide `stand_down` flag every agent's poll loop checks.
pub fn stand_down(ctx: &AppContext) -> ! {
    match ctx.store.set_flag(minion_store::FLAG_STAND_DOWN, "1", "cli") {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct RecruitArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    class: String,
    #[arg(long)]
    model: Option<String>,
}

pub fn recruit(args: RecruitArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::register(
        &ctx.store,
        &ctx.docs_dir,
        &args.name,
        &args.class,
        args.model.as_deref(),
        None,
        "terminal",
        None,
    ) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct AgentArg {
    agent: String,
}

/// Marks `agent` for retirement: the daemon runner will not respawn it on
/// its next phoenix-down or process-exit cycle.
pub fn retire_agent(args: AgentArg, ctx: &AppContext) -> ! {
    match ctx.store.set_retire_marker(&args.agent, "cli") {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

pub fn interrupt(args: AgentArg, ctx: &AppContext) -> ! {
    match ctx.store.set_interrupt(&args.agent, "cli") {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

pub fn resume(args: AgentArg, ctx: &AppContext) -> ! {
    match ctx.store.clear_interrupt(&args.agent) {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct HandOffZoneArgs {
    #[arg(long)]
    agent: String,
    #[arg(long)]
    zone: Option<String>,
}

pub fn hand_off_zone(args: HandOffZoneArgs, ctx: &AppContext) -> ! {
    match ctx.store.set_agent_zone(&args.agent, args.zone.as_deref()) {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}
