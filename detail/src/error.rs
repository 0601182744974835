//! Error types for the festival-detail engine.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors surfaced to the screen layer.
///
/// Store operations never throw across component boundaries: each failure is
/// recorded in state (`last_error`) and the screen translates it into
/// user-facing messaging. Nothing here is retried automatically; every retry
/// is the user re-tapping the action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    /// Transport or parse failure talking to the backend
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Rating outside the 1-5 star range
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// Mutation attempted without a signed-in account
    #[error("sign in to continue")]
    NotAuthenticated,

    /// A conflicting operation is already in flight
    #[error("operation already in progress")]
    OperationInProgress,

    /// The review or participation row no longer exists server-side
    #[error("resource no longer exists")]
    NotFound,
}

impl From<GatewayError> for DetailError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::NotFound => Self::NotFound,
            other => Self::NetworkFailure(other.to_string()),
        }
    }
}
