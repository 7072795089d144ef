//! Error types shared across the workspace.
//!
//! Failures are distinguished by kind rather than by a single opaque error
//! type: validation failures, state-machine violations, schema violations,
//! and numerical instability each carry their own variant so callers can
//! match on what actually went wrong.

use thiserror::Error;

/// A config or body failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError(message.into())
    }
}

/// A single issue discovered while validating a scenario document.
///
/// `path` pinpoints the offending field (e.g. `"bodies[2].mass"`); `message`
/// is a human-readable description of the violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Top-level failure mode for the engine orchestrator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `initialize`/`loadScenario`/`restoreSnapshot` rejected a malformed
    /// config or body.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An operation was attempted in a state that forbids it (uninitialized,
    /// disposed, duplicate id on create, unknown id on update/delete).
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    /// A scenario or snapshot document failed schema validation; the full
    /// issue list is preserved for the caller.
    #[error("schema violation: {} issue(s)", .0.len())]
    Schema(Vec<ValidationIssue>),

    /// A live body became non-finite during integration. `completed_ticks`
    /// reports how many substeps of the requested `step(n)` succeeded
    /// before the failure.
    #[error("numerical instability after {completed_ticks} substep(s): {detail}")]
    NumericalInstability {
        completed_ticks: u64,
        detail: String,
    },
}

impl EngineError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState(message.into())
    }
}
