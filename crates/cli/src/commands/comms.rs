// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! register / send / check-inbox / set-context / set-status / who /
//! list-history / purge-inbox / rename.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub class: String,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, default_value = "terminal")]
    pub transport: String,
    #[arg(long)]
    pub crew: Option<String>,
}

pub fn register(args: RegisterArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::register(
        &ctx.store,
        &ctx.docs_dir,
        &args.name,
        &args.class,
        args.model.as_deref(),
        args.description.as_deref(),
        &args.transport,
        args.crew.as_deref(),
    ) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct SendArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub message: String,
    #[arg(long, default_value = "")]
    pub cc: String,
}

pub fn send(args: SendArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::send(&ctx.store, &ctx.work_dir, &args.from, &args.to, &args.message, &args.cc) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct AgentArg {
    #[arg(long)]
    pub agent: String,
}

pub fn check_inbox(args: AgentArg, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::check_inbox(&ctx.store, &ctx.work_dir, &args.agent) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct SetContextArgs {
    #[arg(long)]
    pub agent: String,
    #[arg(long)]
    pub summary: Option<String>,
    /// Self-reported HP percentage ; sets the
    /// self-report sentinel, so subsequent `update-hp` calls no-op.
    #[arg(long)]
    pub hp: Option<i64>,
    #[arg(long = "file", value_name = "PATH")]
    pub files_modified: Vec<String>,
}

pub fn set_context(args: SetContextArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::set_context(
        &ctx.store,
        &args.agent,
        args.summary.as_deref(),
        args.hp,
        &args.files_modified,
    ) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct SetStatusArgs {
    #[arg(long)]
    pub agent: String,
    #[arg(long)]
    pub status: String,
}

pub fn set_status(args: SetStatusArgs, ctx: &AppContext) -> ! {
    match minion_engine::comms::set_status(&ctx.store, &args.agent, &args.status) {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

pub fn who(ctx: &AppContext, format: OutputFormat) -> ! {
    match ctx.store.list_agents() {
        Ok(agents) => output::succeed(&agents, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(long)]
    pub agent: String,
    #[arg(long, default_value_t = 20)]
    pub limit: i64,
}

pub fn list_history(args: HistoryArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::history(&ctx.store, &ctx.work_dir, &args.agent, args.limit) {
        Ok(rows) => output::succeed(&rows, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct PurgeArgs {
    #[arg(long)]
    pub agent: String,
    #[arg(long, default_value_t = 168)]
    pub older_than_hours: i64,
}

pub fn purge_inbox(args: PurgeArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::purge(&ctx.store, &args.agent, args.older_than_hours) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct RenameArgs {
    #[arg(long)]
    pub old: String,
    #[arg(long)]
    pub new: String,
}

/// Lead-only zone reassignment.
pub fn rename(args: RenameArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::comms::rename(&ctx.store, &args.old, &args.new) {
        Ok(agent) => output::succeed(&agent, format, None),
        Err(e) => output::fail(e),
    }
}
