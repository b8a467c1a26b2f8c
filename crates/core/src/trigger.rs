// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger-word codebook — brevity codes scanned out of message bodies by
//! the comms core. Some words flip session-wide flags (`moon_crash`,
//! `stand_down`); the rest are informational.

/// `(word, meaning)` pairs, in display order.
pub const TRIGGER_WORDS: &[(&str, &str)] = &[
    (
        "fenix_down",
        "Dump all knowledge to disk before context death. Revival protocol.",
    ),
    (
        "moon_crash",
        "Emergency shutdown. Everyone fenix_down NOW. No new task assignments.",
    ),
    (
        "halt",
        "Finish current work, save state (fenix_down), stand down. Graceful pause — not an emergency. You will be resumed later.",
    ),
    ("sitrep", "Request status report from target agent."),
    ("rally", "All agents focus on the specified target/zone."),
    ("retreat", "Pull back from current approach, reassess."),
    (
        "hot_zone",
        "Area is dangerous/complex, proceed with caution.",
    ),
    ("stand_down", "Stop work, prepare to deregister."),
    ("recon", "Investigate before acting. Gather intel first."),
];

/// Words found in `message`, scanned case-insensitively.
pub fn scan_triggers(message: &str) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    TRIGGER_WORDS
        .iter()
        .filter(|(word, _)| lower.contains(word))
        .map(|(word, _)| *word)
        .collect()
}

/// Render the trigger word codebook as a markdown table for onboarding docs.
pub fn format_trigger_codebook() -> String {
    let mut out = String::from("## Trigger Words (Brevity Codes)\n\n");
    out.push_str(
        "Short code words for fast coordination. Use in messages — comms recognizes them automatically.\n\n",
    );
    out.push_str("| Code | Meaning |\n|---|---|\n");
    for (word, meaning) in TRIGGER_WORDS {
        out.push_str(&format!("| `{word}` | {meaning} |\n"));
    }
    out
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
