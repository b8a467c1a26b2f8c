//! Black-box test harness: spawn the `minion` binary against an isolated
//! project directory and database, parse its JSON-first output.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// An isolated project: its own temp work tree, SQLite file, and docs dir.
/// Every command runs as a fresh subprocess against the same files, just
/// like a real fleet of short-lived CLI invocations.
pub struct Project {
    dir: tempfile::TempDir,
    docs_dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs_dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".work")).expect("mkdir .work");
        Project { dir, docs_dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join(".work").join("minion.db")
    }

    /// Write a file relative to the project's `.work` directory — the
    /// root every `*_file` argument is resolved against.
    pub fn work_file(&self, rel: &str, content: &str) -> String {
        let full = self.dir.path().join(".work").join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("mkdir parents");
        }
        std::fs::write(&full, content).expect("write file");
        rel.to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("minion").expect("minion binary built");
        cmd.current_dir(self.path())
            .env("MINION_DB_PATH", self.db_path())
            .env("MINION_DOCS_DIR", self.docs_dir.path())
            .env_remove("MINION_PROJECT")
            .env_remove("MINION_FLOWS_DIR")
            .env_remove("MINION_MISSIONS_DIR");
        cmd
    }

    /// Run a command expecting success; parse stdout as JSON.
    pub fn ok(&self, args: &[&str]) -> Value {
        let assert = self.cmd().args(args).assert().success();
        let out = assert.get_output();
        serde_json::from_slice(&out.stdout).unwrap_or_else(|e| {
            panic!(
                "expected JSON stdout for {args:?}: {e}\nstdout: {}\nstderr: {}",
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            )
        })
    }

    /// Run a command expecting failure; return the `error` string.
    pub fn err(&self, args: &[&str]) -> String {
        let assert = self.cmd().args(args).assert().failure();
        let out = assert.get_output();
        let value: Value = serde_json::from_slice(&out.stdout).unwrap_or_else(|e| {
            panic!(
                "expected JSON error stdout for {args:?}: {e}\nstdout: {}\nstderr: {}",
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            )
        });
        value["error"]
            .as_str()
            .unwrap_or_else(|| panic!("error envelope missing `error` string: {value}"))
            .to_string()
    }

    /// Run a command and return its raw process exit code (for `poll`,
    /// whose exit code carries the `ExitCode` enum, not just pass/fail).
    pub fn exit_code(&self, args: &[&str]) -> (i32, Value) {
        let output = self.cmd().args(args).output().expect("command runs");
        let value: Value = serde_json::from_slice(&output.stdout).unwrap_or(Value::Null);
        (output.status.code().unwrap_or(-1), value)
    }

    pub fn register(&self, name: &str, class: &str) -> Value {
        self.ok(&["register", "--name", name, "--class", class])
    }

    pub fn set_plan(&self, lead: &str, plan_file: &str) -> Value {
        let rel = self.work_file(plan_file, "# Battle plan\n");
        self.ok(&["set-plan", "--set-by", lead, "--plan-file", &rel])
    }
}
