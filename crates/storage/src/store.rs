// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Store` handle. Holds only a resolved path; every public operation
//! opens a fresh connection, does one transaction, and closes. No
//! connection is held across a suspension point.

use crate::error::StoreResult;
use crate::schema;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    /// Open (creating and migrating if needed) the database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let db_path = path.into();
        schema::ensure_schema(&db_path)?;
        Ok(Self { db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// A fresh, pragma-configured connection. Internal to the crate —
    /// callers use the typed per-entity methods instead.
    pub(crate) fn connect(&self) -> StoreResult<Connection> {
        schema::open_connection(&self.db_path)
    }
}
