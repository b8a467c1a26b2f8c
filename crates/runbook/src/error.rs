// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unknown flow {0:?}")]
    UnknownFlow(String),

    #[error("flow {flow:?} YAML is invalid: {reason}")]
    InvalidYaml { flow: String, reason: String },

    #[error("flow {flow:?} stage {stage:?} references unknown stage {target:?} via `{field}`")]
    DanglingReference {
        flow: String,
        stage: String,
        field: &'static str,
        target: String,
    },

    #[error("flow {flow:?} inherits unknown parent {parent:?}")]
    UnknownParent { flow: String, parent: String },

    #[error("flow {flow:?} has a cyclic `inherits` chain")]
    CyclicInheritance { flow: String },

    #[error("flow {flow:?} stage {stage:?} has no outgoing transition for this outcome")]
    NoTransition { flow: String, stage: String },

    #[error("{target:?} is not a valid transition from stage {stage:?} in flow {flow:?}")]
    InvalidExplicitTarget { flow: String, stage: String, target: String },

    #[error("flow {flow:?} stage {stage:?} is not a known stage")]
    UnknownStage { flow: String, stage: String },

    #[error("io error loading flow {flow:?}: {source}")]
    Io {
        flow: String,
        #[source]
        source: std::io::Error,
    },
}

pub type FlowResult<T> = Result<T, FlowError>;
