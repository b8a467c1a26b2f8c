// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion intel <subcommand>`: linked documentation notes for tasks and requirements.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct IntelArgs {
    #[command(subcommand)]
    pub command: IntelCommand,
}

#[derive(Subcommand)]
pub enum IntelCommand {
    /// Register an intel doc already on disk
    Add {
        slug: String,
        doc_path: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        created_by: String,
    },
    /// Link a doc to a task or requirement
    Link {
        slug: String,
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        entity_id: String,
    },
    /// List every intel doc
    List,
    /// Show a single intel doc
    Show { slug: String },
    /// Docs tagged with every one of the given tags
    Find {
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Docs linked to a requirement or any of its open tasks
    WarPlan { requirement_id: i64 },
    /// Re-walk the intel folder, registering new docs (idempotent)
    Reindex {
        #[arg(long)]
        default_author: String,
    },
}

pub fn handle(args: IntelArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match args.command {
        IntelCommand::Add { slug, doc_path, tags, description, created_by } => {
            match minion_engine::intel::add(&ctx.store, &slug, &doc_path, &tags, description.as_deref(), &created_by) {
                Ok(doc) => output::succeed(&doc, format, None),
                Err(e) => output::fail(e),
            }
        }

        IntelCommand::Link { slug, entity_type, entity_id } => {
            match minion_engine::intel::link(&ctx.store, &slug, &entity_type, &entity_id) {
                Ok(()) => output::succeed_empty(),
                Err(e) => output::fail(e),
            }
        }

        IntelCommand::List => match minion_engine::intel::list(&ctx.store) {
            Ok(docs) => output::succeed(&docs, format, None),
            Err(e) => output::fail(e),
        },

        IntelCommand::Show { slug } => match minion_engine::intel::show(&ctx.store, &slug) {
            Ok(doc) => output::succeed(&doc, format, None),
            Err(e) => output::fail(e),
        },

        IntelCommand::Find { tags } => match minion_engine::intel::find(&ctx.store, &tags) {
            Ok(docs) => output::succeed(&docs, format, None),
            Err(e) => output::fail(e),
        },

        IntelCommand::WarPlan { requirement_id } => match minion_engine::intel::war_plan(&ctx.store, requirement_id) {
            Ok(docs) => output::succeed(&docs, format, None),
            Err(e) => output::fail(e),
        },

        IntelCommand::Reindex { default_author } => {
            match minion_engine::intel::reindex(&ctx.store, &ctx.intel_root(), &default_author) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }
    }
}
