// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The docs directory is treated as a contract store :
//! `{docs_dir}/contracts/{name}.json` holds daemon-tunable data (default
//! compaction markers, stream caps, tool-overhead tables); `{docs_dir}/{name}.md`
//! holds prompt-fragment text consumed by [`crate::prompts`].

use serde_json::Value;
use std::path::Path;

/// Reads `{docs_dir}/contracts/{name}.json`. Missing file is not an error —
/// contracts are optional and callers fall back to hardcoded defaults.
pub fn load_contract(docs_dir: &Path, name: &str) -> Option<Value> {
    let path = docs_dir.join("contracts").join(format!("{name}.json"));
    let body = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&body) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(contract = name, error = %e, "corrupt contract, ignoring");
            None
        }
    }
}

/// Reads a markdown prompt fragment `{docs_dir}/{name}.md`, or `None` if absent.
pub fn load_doc(docs_dir: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(docs_dir.join(name)).ok()
}
