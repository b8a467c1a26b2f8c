// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures : a temp `Store` plus a temp artifact
//! root, used by every `*_tests.rs` module in this crate.

#![cfg(test)]

use minion_store::{RegisterInput, Store};
use tempfile::TempDir;

pub struct Fixture {
    pub _db_dir: TempDir,
    pub work_dir: TempDir,
    pub store: Store,
}

pub fn fixture() -> Fixture {
    let db_dir = tempfile::tempdir().expect("tempdir");
    let work_dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(db_dir.path().join("minion.db")).expect("open store");
    Fixture {
        _db_dir: db_dir,
        work_dir,
        store,
    }
}

impl Fixture {
    pub fn register(&self, name: &str, class: &str) -> minion_store::Agent {
        self.store
            .register_agent(RegisterInput {
                name,
                class,
                model: None,
                description: None,
                transport: "terminal",
                crew: None,
            })
            .expect("register")
    }

    /// Registers and marks `agent`'s context fresh so `send`/`update` don't
    /// trip the staleness gate.
    pub fn register_fresh(&self, name: &str, class: &str) -> minion_store::Agent {
        let agent = self.register(name, class);
        self.store.touch_context_updated(name).expect("touch context");
        self.store.get_agent(name).expect("get agent").expect("agent exists")
    }

    pub fn set_plan(&self, agent: &str) {
        self.store.set_battle_plan(agent, "plans/active.md").expect("set plan");
    }

    /// Writes `rel` under the work dir and returns the path passed to
    /// `task create --task-file`.
    pub fn seed_file(&self, rel: &str, body: &str) -> String {
        minion_core::atomic_write(&self.work_dir.path().join(rel), body).expect("seed file");
        rel.to_string()
    }
}
