// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion` — the stateless command-line surface over the fleet database
//! . Every invocation opens its own connection, runs one
//! operation, prints JSON (or a `--human` rendering) to stdout, and exits;
//! there is no resident client-daemon session behind it.

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::{backlog, claims, comms, flows, hp, intel, monitoring, party, plan, poll, req, task};
use context::AppContext;
use output::OutputFormat;

/// Fleet-coordination CLI for long-running LLM-backed agent processes.
#[derive(Parser)]
#[command(name = "minion", version, about)]
struct Cli {
    /// Output format: machine-readable JSON (default) or human-rendered text
    #[arg(short = 'o', long, global = true, default_value = "json")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // --- Task Core ---
    Task(task::TaskArgs),

    // --- Requirements Core ---
    Req(req::ReqArgs),

    // --- Backlog Core ---
    Backlog(backlog::BacklogArgs),

    // --- Intel Core ---
    Intel(intel::IntelArgs),

    // --- Comms Core ---
    Register(comms::RegisterArgs),
    Send(comms::SendArgs),
    CheckInbox(comms::AgentArg),
    SetContext(comms::SetContextArgs),
    SetStatus(comms::SetStatusArgs),
    Who,
    ListHistory(comms::HistoryArgs),
    PurgeInbox(comms::PurgeArgs),
    Rename(comms::RenameArgs),

    // --- File claims ---
    ClaimFile(claims::ClaimFileArgs),
    ReleaseFile(claims::ReleaseFileArgs),
    ListClaims,

    // --- Polling protocol ---
    Poll(poll::PollArgs),

    // --- HP accounting ---
    UpdateHp(hp::UpdateHpArgs),
    HpSummary(hp::HpSummaryArgs),

    // --- Monitoring ---
    PartyStatus,
    Sitrep(monitoring::SitrepArgs),
    CheckActivity(monitoring::AgentArg),
    CheckFreshness(monitoring::AgentArg),

    // --- Battle plan / raid log ---
    SetPlan(plan::SetPlanArgs),
    ShowPlan,
    RetirePlan(plan::RetirePlanArgs),
    RaidLogAdd(plan::RaidLogAddArgs),
    RaidLogList(plan::RaidLogListArgs),

    // --- Party coordination ---
    SpawnParty(party::SpawnPartyArgs),
    StandDown,
    Recruit(party::RecruitArgs),
    RetireAgent(party::AgentArg),
    Interrupt(party::AgentArg),
    Resume(party::AgentArg),
    HandOffZone(party::HandOffZoneArgs),

    // --- Flows ---
    ListFlows,
    ShowFlow(flows::ShowFlowArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.output;

    // `list-flows`/`show-flow` read only the builtin/env-configured flow
    // registry and never touch the database, so they can run without one.
    match cli.command {
        Commands::ListFlows => flows::list_flows(format),
        Commands::ShowFlow(args) => flows::show_flow(args, format),
        command => {
            let ctx = match AppContext::open() {
                Ok(ctx) => ctx,
                Err(e) => output::fail(e),
            };
            dispatch(command, &ctx, format);
        }
    }
}

fn dispatch(command: Commands, ctx: &AppContext, format: OutputFormat) -> ! {
    match command {
        Commands::Task(args) => task::handle(args, ctx, format),
        Commands::Req(args) => req::handle(args, ctx, format),
        Commands::Backlog(args) => backlog::handle(args, ctx, format),
        Commands::Intel(args) => intel::handle(args, ctx, format),

        Commands::Register(args) => comms::register(args, ctx, format),
        Commands::Send(args) => comms::send(args, ctx, format),
        Commands::CheckInbox(args) => comms::check_inbox(args, ctx, format),
        Commands::SetContext(args) => comms::set_context(args, ctx, format),
        Commands::SetStatus(args) => comms::set_status(args, ctx),
        Commands::Who => comms::who(ctx, format),
        Commands::ListHistory(args) => comms::list_history(args, ctx, format),
        Commands::PurgeInbox(args) => comms::purge_inbox(args, ctx, format),
        Commands::Rename(args) => comms::rename(args, ctx, format),

        Commands::ClaimFile(args) => claims::claim_file(args, ctx, format),
        Commands::ReleaseFile(args) => claims::release_file(args, ctx, format),
        Commands::ListClaims => claims::list_claims(ctx, format),

        Commands::Poll(args) => poll::poll(args, ctx, format),

        Commands::UpdateHp(args) => hp::update_hp(args, ctx, format),
        Commands::HpSummary(args) => hp::hp_summary(args, ctx, format),

        Commands::PartyStatus => monitoring::party_status(ctx, format),
        Commands::Sitrep(args) => monitoring::sitrep(args, ctx, format),
        Commands::CheckActivity(args) => monitoring::check_activity(args, ctx, format),
        Commands::CheckFreshness(args) => monitoring::check_freshness(args, ctx, format),

        Commands::SetPlan(args) => plan::set_plan(args, ctx, format),
        Commands::ShowPlan => plan::show_plan(ctx, format),
        Commands::RetirePlan(args) => plan::retire_plan(args, ctx),
        Commands::RaidLogAdd(args) => plan::raid_log_add(args, ctx, format),
        Commands::RaidLogList(args) => plan::raid_log_list(args, ctx, format),

        Commands::SpawnParty(args) => party::spawn_party(args, ctx, format),
        Commands::StandDown => party::stand_down(ctx),
        Commands::Recruit(args) => party::recruit(args, ctx, format),
        Commands::RetireAgent(args) => party::retire_agent(args, ctx),
        Commands::Interrupt(args) => party::interrupt(args, ctx),
        Commands::Resume(args) => party::resume(args, ctx),
        Commands::HandOffZone(args) => party::hand_off_zone(args, ctx),

        Commands::ListFlows | Commands::ShowFlow(_) => unreachable!("handled before AppContext::open"),
    }
}
