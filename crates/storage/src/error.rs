// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-level errors. These wrap `rusqlite` failures and the handful of
//! invariant violations the Store itself enforces (duplicate primary keys,
//! unknown enum values written into a `CHECK`-constrained column). Business
//! rule failures (BLOCKED, Invalid, Transition blocked) are raised by
//! `minion-engine`, not here — the Store only ever reports whether the row
//! it was asked to touch exists and whether the write succeeded.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("migration {0} failed: {1}")]
    Migration(u32, String),
}

pub type StoreResult<T> = Result<T, StoreError>;
