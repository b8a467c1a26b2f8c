// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive file claims and their FIFO waitlist :
//! `claim-file` / `release-file`, used by `tasks::update`'s claim-files
//! reminder and directly by the CLI.

use crate::error::EngineResult;
use minion_store::{ClaimOutcome, FileClaim, Store, Waiter};

pub fn claim_file(store: &Store, file_path: &str, agent: &str) -> EngineResult<ClaimOutcome> {
    store.claim_file(file_path, agent).map_err(Into::into)
}

/// Releases the claim and surfaces (but does not auto-promote) the front
/// of the waitlist, if any.
pub fn release_file(store: &Store, file_path: &str, agent: &str) -> EngineResult<Option<Waiter>> {
    store.release_file(file_path, agent).map_err(Into::into)
}

pub fn release_all_for_agent(store: &Store, agent: &str) -> EngineResult<Vec<Waiter>> {
    store.release_all_for_agent(agent).map_err(Into::into)
}

pub fn list_claims(store: &Store) -> EngineResult<Vec<FileClaim>> {
    store.list_claims().map_err(Into::into)
}
