// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    coder = { AgentClass::Coder, 300 },
    builder = { AgentClass::Builder, 300 },
    recon = { AgentClass::Recon, 300 },
    auditor = { AgentClass::Auditor, 300 },
    lead = { AgentClass::Lead, 900 },
    planner = { AgentClass::Planner, 900 },
    oracle = { AgentClass::Oracle, 1800 },
)]
fn staleness_matches_class(class: AgentClass, expected: u64) {
    assert_eq!(class.staleness_seconds(), expected);
}

#[test]
fn from_str_roundtrips_as_str() {
    for class in AgentClass::ALL {
        assert_eq!(class.as_str().parse::<AgentClass>().unwrap(), class);
    }
}

#[test]
fn from_str_rejects_unknown() {
    assert!("rogue".parse::<AgentClass>().is_err());
}

#[test]
fn lead_has_manage_capability() {
    assert!(AgentClass::Lead.has_capability(Capability::Manage));
    assert!(!AgentClass::Coder.has_capability(Capability::Manage));
}

#[test]
fn classes_with_review_includes_oracle_and_auditor() {
    let reviewers = AgentClass::classes_with(Capability::Review);
    assert!(reviewers.contains(&AgentClass::Oracle));
    assert!(reviewers.contains(&AgentClass::Auditor));
    assert!(!reviewers.contains(&AgentClass::Coder));
}

#[test]
fn task_terminal_statuses_is_subset_of_task_statuses() {
    for status in TASK_TERMINAL_STATUSES {
        assert!(TASK_STATUSES.contains(status));
    }
}

#[test]
fn model_whitelist_rejects_models_outside_the_class() {
    assert!(AgentClass::Lead.allows_model("opus"));
    assert!(!AgentClass::Coder.allows_model("opus"));
    assert!(AgentClass::Coder.allows_model("haiku"));
}
