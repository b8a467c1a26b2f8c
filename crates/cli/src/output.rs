// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-first output, : success prints the value as JSON on
//! stdout and exits 0; failure prints `{"error": "<message>"}` and exits 1.
//! `--human` is a presentation-only override for interactive use.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Human,
}

/// Print a successful result and exit the process with code 0.
///
/// When `format` is [`OutputFormat::Human`], `human` is used if present;
/// otherwise both formats fall back to pretty JSON.
pub fn succeed<T: Serialize>(value: &T, format: OutputFormat, human: Option<String>) -> ! {
    match (format, human) {
        (OutputFormat::Human, Some(rendered)) => println!("{rendered}"),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|e| {
            format!("{{\"error\": \"failed to serialize result: {e}\"}}")
        })),
    }
    std::process::exit(0);
}

/// Print `{}` and exit 0 — for operations whose success is the absence of
/// an error (`set-status`, `link`, …).
pub fn succeed_empty() -> ! {
    println!("{{}}");
    std::process::exit(0);
}

/// Render any failure as `{"error": "<kind-prefixed message>"}` on stdout
/// and exit 1 . `Display` on engine/flow/store error types
/// already carries the `BLOCKED:`/`Invalid`/`Transition blocked:` prefixes.
pub fn fail(err: impl fmt::Display) -> ! {
    println!("{}", serde_json::json!({ "error": err.to_string() }));
    std::process::exit(1);
}
