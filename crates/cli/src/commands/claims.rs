// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `claim-file` / `release-file` / `list-claims`.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::Args;

#[derive(Args)]
pub struct ClaimFileArgs {
    file_path: String,
    #[arg(long)]
    agent: String,
}

pub fn claim_file(args: ClaimFileArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::claims::claim_file(&ctx.store, &args.file_path, &args.agent) {
        Ok(outcome) => output::succeed(&outcome, format, None),
        Err(e) => output::fail(e),
    }
}

#[derive(Args)]
pub struct ReleaseFileArgs {
    file_path: String,
    #[arg(long)]
    agent: String,
}

pub fn release_file(args: ReleaseFileArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::claims::release_file(&ctx.store, &args.file_path, &args.agent) {
        Ok(waiter) => output::succeed(&waiter, format, None),
        Err(e) => output::fail(e),
    }
}

pub fn list_claims(ctx: &AppContext, format: OutputFormat) -> ! {
    match minion_engine::claims::list_claims(&ctx.store) {
        Ok(claims) => output::succeed(&claims, format, None),
        Err(e) => output::fail(e),
    }
}
