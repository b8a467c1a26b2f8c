// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow YAML baked into the binary. These are the shipped defaults; a
//! project may override any of them by name under `MINION_FLOWS_DIR`.

pub const SOURCES: &[(&str, &str)] = &[
    ("task", include_str!("../flows/task.yaml")),
    ("task-fasttrack", include_str!("../flows/task-fasttrack.yaml")),
    ("requirement", include_str!("../flows/requirement.yaml")),
    ("requirement-lite", include_str!("../flows/requirement-lite.yaml")),
];

pub fn source(name: &str) -> Option<&'static str> {
    SOURCES.iter().find(|(n, _)| *n == name).map(|(_, src)| *src)
}

pub fn names() -> Vec<&'static str> {
    SOURCES.iter().map(|(n, _)| *n).collect()
}
