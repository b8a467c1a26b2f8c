// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion backlog <subcommand>`: filesystem-backed backlog items and their
//! promotion into tracked requirements.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct BacklogArgs {
    #[command(subcommand)]
    pub command: BacklogCommand,
}

#[derive(Subcommand)]
pub enum BacklogCommand {
    /// File a new backlog item
    Add {
        file_path: String,
        #[arg(long)]
        item_type: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "normal")]
        priority: String,
        #[arg(long)]
        source: Option<String>,
    },
    /// List every backlog item
    List,
    /// Show a single backlog item
    Show { file_path: String },
    /// Edit title/priority
    Update {
        file_path: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Mark an item killed
    Kill { file_path: String },
    /// Mark an item deferred
    Defer { file_path: String },
    /// Move a killed/deferred item back to open
    Reopen { file_path: String },
    /// Turn a backlog item into a tracked requirement
    Promote {
        file_path: String,
        #[arg(long)]
        created_by: String,
    },
    /// Re-walk the backlog folders, registering new items (idempotent)
    Reindex {
        #[arg(long)]
        source: Option<String>,
    },
}

pub fn handle(args: BacklogArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match args.command {
        BacklogCommand::Add { file_path, item_type, title, priority, source } => {
            match minion_engine::backlog::add(&ctx.store, &file_path, &item_type, &title, &priority, source.as_deref()) {
                Ok(item) => output::succeed(&item, format, None),
                Err(e) => output::fail(e),
            }
        }

        BacklogCommand::List => match minion_engine::backlog::list(&ctx.store) {
            Ok(items) => output::succeed(&items, format, None),
            Err(e) => output::fail(e),
        },

        BacklogCommand::Show { file_path } => match minion_engine::backlog::show(&ctx.store, &file_path) {
            Ok(item) => output::succeed(&item, format, None),
            Err(e) => output::fail(e),
        },

        BacklogCommand::Update { file_path, title, priority } => {
            match minion_engine::backlog::update(&ctx.store, &file_path, title.as_deref(), priority.as_deref()) {
                Ok(item) => output::succeed(&item, format, None),
                Err(e) => output::fail(e),
            }
        }

        BacklogCommand::Kill { file_path } => match minion_engine::backlog::kill(&ctx.store, &file_path) {
            Ok(item) => output::succeed(&item, format, None),
            Err(e) => output::fail(e),
        },

        BacklogCommand::Defer { file_path } => match minion_engine::backlog::defer(&ctx.store, &file_path) {
            Ok(item) => output::succeed(&item, format, None),
            Err(e) => output::fail(e),
        },

        BacklogCommand::Reopen { file_path } => match minion_engine::backlog::reopen(&ctx.store, &file_path) {
            Ok(item) => output::succeed(&item, format, None),
            Err(e) => output::fail(e),
        },

        BacklogCommand::Promote { file_path, created_by } => {
            match minion_engine::requirements::promote_from_backlog(&ctx.store, &ctx.work_dir, &file_path, &created_by) {
                Ok(req) => output::succeed(&req, format, None),
                Err(e) => output::fail(e),
            }
        }

        BacklogCommand::Reindex { source } => {
            match minion_engine::backlog::reindex(&ctx.store, &ctx.backlog_root(), source.as_deref()) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }
    }
}
