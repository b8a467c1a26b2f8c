// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `minion-agentd` — the per-agent supervisor process. A party spawn starts
//! one of these per roster entry, wired to the shared database and docs
//! directory via environment variables.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use minion_adapters::ProcessInvoker;
use minion_daemon::RunnerConfig;
use minion_store::Store;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("minion-agentd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("minion-agentd {}", env!("CARGO_PKG_VERSION"));
                println!("Per-agent supervisor: boots a child LLM CLI and drives it through poll/invoke cycles.");
                println!();
                println!("Configured entirely via environment (MINION_AGENT, MINION_DB_PATH, MINION_DOCS_DIR, ...).");
                println!("Normally spawned by `minion spawn-party`, not invoked directly.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: minion-agentd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let cfg = RunnerConfig::from_env().map_err(|e| {
        eprintln!("error: {e}");
        e
    })?;

    rotate_log_if_needed(&log_path(&cfg));
    let _log_guard = setup_logging(&cfg)?;

    info!(agent = %cfg.agent, "minion-agentd starting");

    let store = Store::open(cfg.db_path.as_path())?;
    let invoker = ProcessInvoker;

    let stop = Arc::new(AtomicBool::new(false));
    spawn_signal_handlers(Arc::clone(&stop))?;

    if let Err(e) = minion_daemon::runner::run(&cfg, &store, &invoker, stop.as_ref()).await {
        error!(agent = %cfg.agent, error = %e, "runner exited with error");
        return Err(e.into());
    }

    info!(agent = %cfg.agent, "minion-agentd stopped");
    Ok(())
}

fn spawn_signal_handlers(stop: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, stopping after current turn"),
            _ = sigint.recv() => info!("received SIGINT, stopping after current turn"),
        }
        stop.store(true, Ordering::SeqCst);
    });
    Ok(())
}

fn log_path(cfg: &RunnerConfig) -> std::path::PathBuf {
    cfg.log_dir.join(format!("{}.agentd.log", cfg.agent))
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotate `{agent}.agentd.log` to `.1` if it has grown past [`MAX_LOG_SIZE`].
/// Best-effort: rotation failures are silently ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }
    let rotated = format!("{}.1", log_path.display());
    let _ = std::fs::rename(log_path, rotated);
}

fn setup_logging(
    cfg: &RunnerConfig,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&cfg.log_dir)?;
    let path = log_path(cfg);
    let file_appender = tracing_appender::rolling::never(
        path.parent().unwrap_or(&cfg.log_dir),
        path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("agentd.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
