// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Battle plan and raid log : the active battle plan is a
//! hard precondition for `task create` (non-chore) and `send`.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;

#[derive(Args)]
pub struct SetPlanArgs {
    #[arg(long)]
    set_by: String,
    #[arg(long)]
    plan_file: String,
}

pub fn set_plan(args: SetPlanArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match ctx.store.set_battle_plan(&args.set_by, &args.plan_file) {
        Ok(plan) => output::succeed(&plan, format, None),
        Err(e) => output::fail(e),
    }
}

pub fn show_plan(ctx: &AppContext, format: OutputFormat) -> ! {
    match ctx.store.active_battle_plan() {
        Ok(Some(plan)) => output::succeed(&plan, format, None),
        Ok(None) => output::fail("BLOCKED: no active battle plan"),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct RetirePlanArgs {
    plan_id: i64,
}

pub fn retire_plan(args: RetirePlanArgs, ctx: &AppContext) -> ! {
    match ctx.store.set_battle_plan_status(args.plan_id, "retired") {
        Ok(()) => output::succeed_empty(),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct RaidLogAddArgs {
    #[arg(long)]
    agent: String,
    #[arg(long)]
    entry_file: String,
    #[arg(long, default_value = "normal")]
    priority: String,
}

pub fn raid_log_add(args: RaidLogAddArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match ctx.store.append_raid_log(&args.agent, &args.entry_file, &args.priority) {
        Ok(entry) => output::succeed(&entry, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct RaidLogListArgs {
    #[arg(long, default_value_t = 50)]
    limit: i64,
}

pub fn raid_log_list(args: RaidLogListArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match ctx.store.recent_raid_log(args.limit) {
        Ok(entries) => output::succeed(&entries, format, None),
        Err(e) => output::fail(e),
    }
}
