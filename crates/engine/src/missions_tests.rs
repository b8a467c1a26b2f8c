// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(test)]

use crate::missions;
use minion_core::AgentClass;

#[test]
fn parse_mission_rejects_malformed_yaml() {
    let err = missions::parse_mission("name: [unterminated").expect_err("malformed yaml");
    assert!(err.to_string().contains("malformed mission yaml"));
}

#[test]
fn resolve_always_includes_lead_even_with_no_required_capabilities() {
    let mission = missions::parse_mission("name: quiet-mission\n").expect("parse");
    let resolved = missions::resolve(&mission).expect("resolve");
    assert!(resolved.classes.contains(&AgentClass::Lead));
    assert_eq!(resolved.classes.len(), 1);
}

#[test]
fn resolve_picks_a_minimum_covering_set_for_build() {
    let text = "name: ship-it\nrequired_capabilities: [build]\n";
    let mission = missions::parse_mission(text).expect("parse");
    let resolved = missions::resolve(&mission).expect("resolve");

    assert!(resolved.classes.contains(&AgentClass::Lead));
    assert!(resolved.classes.contains(&AgentClass::Builder), "builder is the only class with `build`");
    assert_eq!(resolved.classes.len(), 2);
}

#[test]
fn resolve_filters_roster_to_only_covering_classes() {
    let text = "
name: ship-it
required_capabilities: [build]
roster:
  - name: builder-1
    class: builder
  - name: oracle-1
    class: oracle
";
    let mission = missions::parse_mission(text).expect("parse");
    let resolved = missions::resolve(&mission).expect("resolve");
    assert_eq!(resolved.agents.len(), 1);
    assert_eq!(resolved.agents[0].name, "builder-1");
}

#[test]
fn resolve_rejects_unknown_roster_class() {
    let text = "
name: ship-it
roster:
  - name: mystery-1
    class: wizard
";
    let mission = missions::parse_mission(text).expect("parse");
    let err = missions::resolve(&mission).expect_err("unknown class");
    assert!(err.to_string().contains("unknown class"));
}
