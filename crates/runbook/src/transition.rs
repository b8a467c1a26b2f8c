// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pure transition function. It never touches the database — the
//! caller (minion-engine) reads the current stage, calls `apply_transition`,
//! and performs the status `UPDATE` plus `transition_log` append itself, in
//! the same transaction.

use crate::error::{FlowError, FlowResult};
use crate::flow::Flow;

#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest<'a> {
    pub current_stage: &'a str,
    pub passed: bool,
    /// Take the stage's `alt_next` instead of `next`/`fail`, e.g. a
    /// reviewer closing a task directly from `fixed` on a fast-track flow.
    pub use_alt: bool,
    /// Override the computed target with a caller-named stage, e.g.
    /// decompose() hopping straight to `tasked`. Must be one of
    /// `current_stage`'s declared `{next, fail, alt_next}` — arbitrary
    /// jumps are rejected, `use_alt`/`passed` are ignored when set.
    pub explicit_target: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub from_stage: String,
    pub to_stage: String,
    pub terminal: bool,
    pub parked: bool,
}

/// Compute the target stage for a transition out of `request.current_stage`.
/// Does not check gates; callers run [`crate::gate::all_gates_pass`] first
/// and refuse the transition themselves if it fails.
pub fn apply_transition(flow: &Flow, request: TransitionRequest<'_>) -> FlowResult<TransitionResult> {
    let stage = flow
        .get_stage(request.current_stage)
        .ok_or_else(|| FlowError::UnknownStage {
            flow: flow.name.clone(),
            stage: request.current_stage.to_string(),
        })?;

    let target = if let Some(explicit) = request.explicit_target {
        let valid = flow.valid_transitions(request.current_stage);
        if !valid.contains(explicit) {
            return Err(FlowError::InvalidExplicitTarget {
                flow: flow.name.clone(),
                stage: request.current_stage.to_string(),
                target: explicit.to_string(),
            });
        }
        Some(explicit.to_string())
    } else if request.use_alt {
        stage.alt_next.clone()
    } else if request.passed {
        stage.next.clone()
    } else {
        stage.fail.clone()
    };

    let target = target.ok_or_else(|| FlowError::NoTransition {
        flow: flow.name.clone(),
        stage: request.current_stage.to_string(),
    })?;

    if !flow.stages.contains_key(&target) {
        return Err(FlowError::DanglingReference {
            flow: flow.name.clone(),
            stage: request.current_stage.to_string(),
            field: if request.use_alt { "alt_next" } else { "next/fail" },
            target,
        });
    }

    let terminal = flow.is_terminal(&target);
    let parked = flow.is_parked(&target);
    Ok(TransitionResult {
        from_stage: request.current_stage.to_string(),
        to_stage: target,
        terminal,
        parked,
    })
}
