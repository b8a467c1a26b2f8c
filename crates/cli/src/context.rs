// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation wiring: open the Store fresh, resolve the working
//! directories, run the command, print, exit. There is no resident daemon
//! behind the CLI — every call is a one-shot open-do-close against the
//! shared SQLite file.

use minion_store::Store;
use std::path::PathBuf;

pub struct AppContext {
    pub store: Store,
    pub work_dir: PathBuf,
    pub docs_dir: PathBuf,
}

impl AppContext {
    pub fn open() -> Result<Self, String> {
        let db_path = minion_core::resolve_db_path();
        let store = Store::open(&db_path).map_err(|e| format!("failed to open database at {}: {e}", db_path.display()))?;
        Ok(AppContext {
            store,
            work_dir: minion_core::resolve_work_dir(None),
            docs_dir: minion_core::resolve_docs_dir(),
        })
    }

    pub fn requirements_root(&self) -> PathBuf {
        self.work_dir.join("requirements")
    }

    pub fn backlog_root(&self) -> PathBuf {
        self.work_dir.join("backlog")
    }

    pub fn intel_root(&self) -> PathBuf {
        self.work_dir.join("intel")
    }
}
