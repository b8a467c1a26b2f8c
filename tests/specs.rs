//! Behavioral specifications for the `minion` CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/dag_smoke.rs"]
mod dag_smoke;
#[path = "specs/dependency.rs"]
mod dependency;
#[path = "specs/comms_discipline.rs"]
mod comms_discipline;
#[path = "specs/poll_and_hp.rs"]
mod poll_and_hp;
#[path = "specs/requirements_and_backlog.rs"]
mod requirements_and_backlog;
