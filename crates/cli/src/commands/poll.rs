// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion poll` — the blocking long-poll loop agents sit in between turns.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;

#[derive(Args)]
pub struct PollArgs {
    #[arg(long)]
    agent: String,
    #[arg(long, default_value_t = 5)]
    interval: u64,
    /// 0 blocks indefinitely
    #[arg(long, default_value_t = 0)]
    timeout: u64,
}

pub fn poll(args: PollArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::poll::poll(&ctx.store, &ctx.work_dir, &args.agent, args.interval, args.timeout) {
        Ok(result) => {
            let code = result.exit_code as i32;
            match format {
                OutputFormat::Human => println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default()),
            }
            std::process::exit(code);
        }
        Err(e) => output::fail(e),
    }
}
