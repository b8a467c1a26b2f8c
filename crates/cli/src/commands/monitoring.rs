// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `party-status` / `sitrep` / `check-activity` / `check-freshness`
//!  — read-only fused snapshots.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;
use minion_engine::error::EngineError;

pub fn party_status(ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::monitoring::party_status(&ctx.store, &ctx.work_dir) {
        Ok(statuses) => output::succeed(&statuses, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct SitrepArgs {
    #[arg(long, default_value_t = 20)]
    recent_limit: i64,
}

pub fn sitrep(args: SitrepArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::monitoring::sitrep(&ctx.store, &ctx.work_dir, args.recent_limit) {
        Ok(report) => output::succeed(&report, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct AgentArg {
    #[arg(long)]
    agent: String,
}

pub fn check_activity(args: AgentArg, ctx: &AppContext, format: OutputFormat) -> ! {
    let agent = match ctx.store.get_agent(&args.agent) {
        Ok(Some(agent)) => agent,
        Ok(None) => output::fail(format!("BLOCKED: {} is not registered", args.agent)),
        Err(e) => output::fail(EngineError::from(e)),
    };
    match minion_engine::monitoring::check_activity(&ctx.store, &ctx.work_dir, &agent) {
        Ok(judgment) => output::succeed(&judgment, format, Some(judgment.as_str().to_string())),
        Err(e) => output::fail(e),
    }
}

pub fn check_freshness(args: AgentArg, ctx: &AppContext, format: OutputFormat) -> ! {
    let agent = match ctx.store.get_agent(&args.agent) {
        Ok(Some(agent)) => agent,
        Ok(None) => output::fail(format!("BLOCKED: {} is not registered", args.agent)),
        Err(e) => output::fail(EngineError::from(e)),
    };
    let report = minion_engine::monitoring::check_freshness(&agent);
    output::succeed(&report, format, None);
}
