// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion req <subcommand>`: requirement lifecycle and decomposition.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};
use minion_engine::requirements::DecomposeChild;

#[derive(Args)]
pub struct ReqArgs {
    #[command(subcommand)]
    pub command: ReqCommand,
}

/// One `--child slug:title[:blocked-by-csv]` entry for `decompose`.
fn parse_child(raw: &str) -> Result<(String, String, Vec<usize>), String> {
    let mut parts = raw.splitn(3, ':');
    let slug = parts.next().ok_or("missing slug")?.to_string();
    let title = parts.next().ok_or("missing title")?.to_string();
    let blocked_by = match parts.next() {
        Some(csv) if !csv.is_empty() => csv
            .split(',')
            .map(|s| s.trim().parse::<usize>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<usize>, String>>()?,
        _ => Vec::new(),
    };
    Ok((slug, title, blocked_by))
}

#[derive(Subcommand)]
pub enum ReqCommand {
    /// Register a requirement folder already on disk
    Register {
        file_path: String,
        #[arg(long)]
        origin: String,
        #[arg(long, default_value = "requirement")]
        flow_type: String,
        #[arg(long)]
        parent_id: Option<i64>,
        #[arg(long)]
        created_by: String,
        #[arg(long, default_value = "seed")]
        stage: String,
    },
    /// Re-walk the requirements tree, registering new folders (idempotent)
    Reindex {
        #[arg(long)]
        created_by: String,
    },
    /// Create a requirement via `promote-from-backlog`-style seeding
    Create {
        file_path: String,
        #[arg(long)]
        origin: String,
        #[arg(long, default_value = "requirement")]
        flow_type: String,
        #[arg(long)]
        created_by: String,
    },
    /// List every requirement row
    List,
    /// Show a single requirement by id
    Status { requirement_id: i64 },
    /// Advance stage (explicit next/fail plus the auto-advance walk)
    Update {
        requirement_id: i64,
        #[arg(long)]
        triggered_by: String,
        #[arg(long)]
        passed: bool,
        #[arg(long)]
        use_alt: bool,
        /// Hop straight to a named stage instead of following next/fail/alt_next.
        /// Must be one of the current stage's declared transitions.
        #[arg(long)]
        target: Option<String>,
    },
    /// Render the requirement subtree as an ASCII outline
    Tree { requirement_id: i64 },
    /// Requirements with no parent and no children
    Orphans,
    /// Requirements with no linked tasks
    Unlinked,
    /// Link an intel doc to a requirement
    Link {
        requirement_id: i64,
        #[arg(long)]
        intel: String,
    },
    /// Split a requirement into child requirements + tasks
    Decompose {
        requirement_id: i64,
        #[arg(long)]
        created_by: String,
        /// `slug:title[:blocked-by-csv]`, repeatable
        #[arg(long = "child", required = true)]
        children: Vec<String>,
    },
    /// Write the itemized-requirements artifact and advance to itemized
    Itemize {
        requirement_id: i64,
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    /// Write a findings artifact and advance to decomposing
    Findings {
        requirement_id: i64,
        #[arg(long)]
        root_cause: String,
        #[arg(long)]
        evidence: String,
        #[arg(long)]
        recommendation: String,
    },
    /// Roll the subtree into one markdown status report
    Report { requirement_id: i64 },
    /// Lead-only multi-hop shortcut to a target stage
    SkipWalk {
        requirement_id: i64,
        #[arg(long)]
        lead: String,
        #[arg(long)]
        target: String,
    },
}

pub fn handle(args: ReqArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match args.command {
        ReqCommand::Register { file_path, origin, flow_type, parent_id, created_by, stage } => {
            match minion_engine::requirements::register(&ctx.store, &file_path, &origin, &flow_type, parent_id, &created_by, &stage) {
                Ok(req) => output::succeed(&req, format, None),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Reindex { created_by } => {
            match minion_engine::requirements::reindex(&ctx.store, &ctx.requirements_root(), &created_by) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Create { file_path, origin, flow_type, created_by } => {
            match minion_engine::requirements::register(&ctx.store, &file_path, &origin, &flow_type, None, &created_by, "seed") {
                Ok(req) => output::succeed(&req, format, None),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::List => match ctx.store.list_requirements() {
            Ok(reqs) => output::succeed(&reqs, format, None),
            Err(e) => output::fail(e),
        },

        ReqCommand::Status { requirement_id } => match ctx.store.get_requirement(requirement_id) {
            Ok(Some(req)) => output::succeed(&req, format, None),
            Ok(None) => output::fail(format!("BLOCKED: requirement {requirement_id} not found")),
            Err(e) => output::fail(e),
        },

        ReqCommand::Update { requirement_id, triggered_by, passed, use_alt, target } => {
            match minion_engine::requirements::update_stage(
                &ctx.store,
                &ctx.work_dir,
                requirement_id,
                &triggered_by,
                passed,
                use_alt,
                target.as_deref(),
            ) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Tree { requirement_id } => match render_tree(ctx, requirement_id) {
            Ok(text) => output::succeed(&text, format, Some(text.clone())),
            Err(e) => output::fail(e),
        },

        ReqCommand::Orphans => match ctx.store.list_requirements() {
            Ok(reqs) => {
                let orphans: Vec<_> = reqs.into_iter().filter(|r| r.parent_id.is_none()).collect();
                output::succeed(&orphans, format, None)
            }
            Err(e) => output::fail(e),
        },

        ReqCommand::Unlinked => match unlinked(ctx) {
            Ok(reqs) => output::succeed(&reqs, format, None),
            Err(e) => output::fail(e),
        },

        ReqCommand::Link { requirement_id, intel } => {
            match minion_engine::intel::link(&ctx.store, &intel, "requirement", &requirement_id.to_string()) {
                Ok(()) => output::succeed_empty(),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Decompose { requirement_id, created_by, children } => {
            let parsed: Result<Vec<(String, String, Vec<usize>)>, String> = children.iter().map(|c| parse_child(c)).collect();
            let parsed = match parsed {
                Ok(p) => p,
                Err(e) => output::fail(format!("Invalid child spec: {e}")),
            };
            let decompose_children: Vec<DecomposeChild<'_>> = parsed
                .iter()
                .map(|(slug, title, blocked_by)| DecomposeChild {
                    slug,
                    title,
                    description: None,
                    task_type: None,
                    blocked_by: blocked_by.clone(),
                })
                .collect();
            match minion_engine::requirements::decompose(&ctx.store, &ctx.work_dir, requirement_id, &decompose_children, &created_by) {
                Ok(reqs) => output::succeed(&reqs, format, None),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Itemize { requirement_id, items } => {
            match minion_engine::requirements::itemize(&ctx.store, &ctx.work_dir, requirement_id, &items) {
                Ok(()) => output::succeed_empty(),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Findings { requirement_id, root_cause, evidence, recommendation } => {
            match minion_engine::requirements::findings(&ctx.store, &ctx.work_dir, requirement_id, &root_cause, &evidence, &recommendation) {
                Ok(()) => output::succeed_empty(),
                Err(e) => output::fail(e),
            }
        }

        ReqCommand::Report { requirement_id } => match minion_engine::requirements::report(&ctx.store, requirement_id) {
            Ok(text) => output::succeed(&text, format, Some(text.clone())),
            Err(e) => output::fail(e),
        },

        ReqCommand::SkipWalk { requirement_id, lead, target } => {
            match minion_engine::requirements::skip_walk(&ctx.store, &ctx.work_dir, &lead, requirement_id, &target) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }
    }
}

fn render_tree(ctx: &AppContext, requirement_id: i64) -> Result<String, minion_engine::error::EngineError> {
    let root = ctx
        .store
        .get_requirement(requirement_id)?
        .ok_or_else(|| minion_engine::error::EngineError::blocked(format!("requirement {requirement_id} not found")))?;
    let mut out = format!("{} ({})\n", root.file_path, root.stage);
    for child in ctx.store.children_of(root.id)? {
        out.push_str(&format!("  {} ({})\n", child.file_path, child.stage));
    }
    Ok(out)
}

fn unlinked(ctx: &AppContext) -> Result<Vec<minion_store::Requirement>, minion_engine::error::EngineError> {
    let reqs = ctx.store.list_requirements()?;
    let mut out = Vec::new();
    for req in reqs {
        let tasks = ctx.store.tasks_for_requirement_ids(&[req.id], None)?;
        if tasks.is_empty() {
            out.push(req);
        }
    }
    Ok(out)
}
