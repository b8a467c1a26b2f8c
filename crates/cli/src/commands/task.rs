// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion task <subcommand>`: task creation, assignment, and the DAG walk.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task (lead-only unless --task-type chore)
    Create {
        #[arg(long)]
        creator: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        task_file: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long, default_value = "")]
        blocked_by: String,
        #[arg(long)]
        class_required: Option<String>,
        #[arg(long, default_value = "task")]
        flow_type: String,
        #[arg(long, default_value = "feature")]
        task_type: String,
        #[arg(long)]
        requirement_id: Option<i64>,
    },
    /// Assign a task to an agent (lead-only)
    Assign {
        #[arg(long)]
        lead: String,
        task_id: i64,
        #[arg(long)]
        agent: String,
    },
    /// Update task status/progress
    Update {
        task_id: i64,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        progress: Option<String>,
        #[arg(long)]
        result_file: Option<String>,
        #[arg(long)]
        files: Option<String>,
        #[arg(long)]
        triggered_by: String,
    },
    /// List every task row
    List,
    /// Get a single task row
    Get { task_id: i64 },
    /// Claim a task (atomic; race-safe)
    Pull {
        task_id: i64,
        #[arg(long)]
        agent: String,
    },
    /// Submit a result artifact
    Result {
        task_id: i64,
        #[arg(long)]
        triggered_by: String,
        #[arg(long)]
        content: String,
    },
    /// Record a review verdict
    Review {
        task_id: i64,
        #[arg(long)]
        triggered_by: String,
        #[arg(long)]
        passed: bool,
        #[arg(long)]
        content: String,
    },
    /// Record a test-report verdict
    Test {
        task_id: i64,
        #[arg(long)]
        triggered_by: String,
        #[arg(long)]
        passed: bool,
        #[arg(long)]
        content: String,
    },
    /// Record a block with a reason
    Block {
        task_id: i64,
        #[arg(long)]
        triggered_by: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        content: String,
    },
    /// Lead-only fast close, bypassing the DAG
    Done {
        task_id: i64,
        #[arg(long)]
        lead: String,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Inline the task's own spec/description file
    Spec { task_id: i64 },
    /// Lead-only create-spec-file-and-row in one call
    Define {
        #[arg(long)]
        lead: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        task_file: String,
        #[arg(long)]
        spec_body: String,
        #[arg(long, default_value = "task")]
        flow_type: String,
        #[arg(long, default_value = "feature")]
        task_type: String,
        #[arg(long)]
        class_required: Option<String>,
        #[arg(long)]
        requirement_id: Option<i64>,
    },
    /// Close via the DAG (requires a result_file)
    Close {
        task_id: i64,
        #[arg(long)]
        status: String,
        #[arg(long)]
        triggered_by: String,
    },
    /// Lead-only: move a terminal task back out of terminal
    Reopen {
        task_id: i64,
        #[arg(long)]
        lead: String,
        #[arg(long)]
        to_status: String,
    },
    /// Drive the DAG transition engine directly
    CompletePhase {
        task_id: i64,
        #[arg(long)]
        passed: bool,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        triggered_by: String,
    },
    /// Ordered (stage, agent, timestamp) transition history
    Lineage { task_id: i64 },
}

pub fn handle(args: TaskArgs, ctx: &AppContext, format: OutputFormat) -> ! {
    match args.command {
        TaskCommand::Create {
            creator,
            title,
            task_file,
            project,
            zone,
            blocked_by,
            class_required,
            flow_type,
            task_type,
            requirement_id,
        } => match minion_engine::tasks::create(
            &ctx.store,
            &ctx.work_dir,
            &creator,
            &title,
            &task_file,
            project.as_deref(),
            zone.as_deref(),
            &blocked_by,
            class_required.as_deref(),
            &flow_type,
            &task_type,
            requirement_id,
        ) {
            Ok(task) => output::succeed(&task, format, None),
            Err(e) => output::fail(e),
        },

        TaskCommand::Assign { lead, task_id, agent } => {
            match minion_engine::tasks::assign(&ctx.store, &lead, task_id, &agent) {
                Ok(task) => output::succeed(&task, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Update {
            task_id,
            status,
            progress,
            result_file,
            files,
            triggered_by,
        } => match minion_engine::tasks::update(
            &ctx.store,
            task_id,
            status.as_deref(),
            progress.as_deref(),
            result_file.as_deref(),
            files.as_deref(),
            &triggered_by,
        ) {
            Ok(outcome) => output::succeed(&outcome, format, None),
            Err(e) => output::fail(e),
        },

        TaskCommand::List => match ctx.store.list_tasks() {
            Ok(tasks) => output::succeed(&tasks, format, None),
            Err(e) => output::fail(e),
        },

        TaskCommand::Get { task_id } => match ctx.store.get_task(task_id) {
            Ok(Some(task)) => output::succeed(&task, format, None),
            Ok(None) => output::fail(format!("BLOCKED: task {task_id} not found")),
            Err(e) => output::fail(e),
        },

        TaskCommand::Pull { task_id, agent } => {
            match minion_engine::tasks::pull(&ctx.store, &ctx.work_dir, task_id, &agent) {
                Ok(pulled) => output::succeed(&pulled, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Result { task_id, triggered_by, content } => {
            match minion_engine::tasks::submit_result(&ctx.store, &ctx.work_dir, task_id, &triggered_by, &content) {
                Ok(task) => output::succeed(&task, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Review { task_id, triggered_by, passed, content } => {
            match minion_engine::tasks::review(&ctx.store, &ctx.work_dir, task_id, &triggered_by, passed, &content) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Test { task_id, triggered_by, passed, content } => {
            match minion_engine::tasks::test_report(&ctx.store, &ctx.work_dir, task_id, &triggered_by, passed, &content) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Block { task_id, triggered_by, reason, content } => {
            match minion_engine::tasks::block(&ctx.store, &ctx.work_dir, task_id, &triggered_by, &reason, &content) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Done { task_id, lead, summary } => {
            match minion_engine::tasks::done(&ctx.store, &ctx.work_dir, &lead, task_id, summary.as_deref()) {
                Ok(task) => output::succeed(&task, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Spec { task_id } => match minion_engine::tasks::read_spec(&ctx.store, &ctx.work_dir, task_id) {
            Ok(body) => output::succeed(&body, format, Some(body.clone())),
            Err(e) => output::fail(e),
        },

        TaskCommand::Define {
            lead,
            title,
            task_file,
            spec_body,
            flow_type,
            task_type,
            class_required,
            requirement_id,
        } => match minion_engine::tasks::define(
            &ctx.store,
            &ctx.work_dir,
            &lead,
            &title,
            &task_file,
            &spec_body,
            &flow_type,
            &task_type,
            class_required.as_deref(),
            requirement_id,
        ) {
            Ok(task) => output::succeed(&task, format, None),
            Err(e) => output::fail(e),
        },

        TaskCommand::Close { task_id, status, triggered_by } => {
            match minion_engine::tasks::close(&ctx.store, &ctx.work_dir, task_id, &status, &triggered_by) {
                Ok(task) => output::succeed(&task, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Reopen { task_id, lead, to_status } => {
            match minion_engine::tasks::reopen(&ctx.store, &lead, task_id, &to_status) {
                Ok(task) => output::succeed(&task, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::CompletePhase { task_id, passed, reason, triggered_by } => {
            match minion_engine::tasks::complete_phase(
                &ctx.store,
                &ctx.work_dir,
                task_id,
                passed,
                reason.as_deref(),
                &triggered_by,
            ) {
                Ok(outcome) => output::succeed(&outcome, format, None),
                Err(e) => output::fail(e),
            }
        }

        TaskCommand::Lineage { task_id } => match minion_engine::tasks::lineage(&ctx.store, task_id) {
            Ok(rows) => output::succeed(&rows, format, None),
            Err(e) => output::fail(e),
        },
    }
}
