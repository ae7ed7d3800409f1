//! Domain error types

use thiserror::Error;

/// Session reconciliation errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation that drives the model provider ran before one was bound
    #[error("session {0} has no model provider bound")]
    ModelProviderNotBound(String),

    /// The initial population ran twice
    #[error("session {0} is already populated")]
    AlreadyPopulated(String),

    /// Session not found in the store
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Backing store failure outside the optimistic write path
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Scroll restoration errors
#[derive(Debug, Error)]
pub enum ScrollError {
    /// Position capture only understands linear (vertical list) layouts
    #[error("scroll restore requires a linear layout, found {0}")]
    NonLinearLayout(String),
}
