// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured failures for every business-rule operation. The CLI
//! boundary renders `Display` straight into `{"error": "..."}`.

use minion_flow::FlowError;
use minion_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("BLOCKED: {0}")]
    Blocked(String),

    #[error("Invalid {0}")]
    Invalid(String),

    #[error("Transition blocked: {0}")]
    TransitionBlocked(String),

    #[error("Race lost")]
    RaceLost,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fs(#[from] minion_core::FsError),

    #[error("{0}")]
    Other(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn blocked(msg: impl Into<String>) -> Self {
        EngineError::Blocked(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::Invalid(msg.into())
    }
}
