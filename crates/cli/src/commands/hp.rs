// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `update-hp` / `hp-summary`.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;
use minion_engine::error::EngineError;

#[derive(Args)]
pub struct UpdateHpArgs {
    #[arg(long)]
    agent: String,
    #[arg(long, default_value_t = 0)]
    input_tokens: i64,
    #[arg(long, default_value_t = 0)]
    output_tokens: i64,
    #[arg(long)]
    limit: i64,
    #[arg(long, default_value_t = 0)]
    turn_input: i64,
    #[arg(long, default_value_t = 0)]
    turn_output: i64,
}

pub fn update_hp(args: UpdateHpArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::hp::update_hp(
        &ctx.store,
        &ctx.work_dir,
        &args.agent,
        args.input_tokens,
        args.output_tokens,
        args.limit,
        args.turn_input,
        args.turn_output,
    ) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct HpSummaryArgs {
    #[arg(long)]
    agent: String,
}

pub fn hp_summary(args: HpSummaryArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    let agent = match ctx.store.get_agent(&args.agent) {
        Ok(Some(agent)) => agent,
        Ok(None) => output::fail(format!("BLOCKED: {} is not registered", args.agent)),
        Err(e) => output::fail(EngineError::from(e)),
    };
    let summary = minion_engine::hp::hp_summary(&agent);
    let rendered = summary.render();
    output::succeed(&summary, format, Some(rendered));
}
