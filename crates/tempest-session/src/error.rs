//! Error types for the session core

use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Opaque failure surfaced unchanged from an external collaborator
/// (connector, roster, interaction facet).
#[derive(Debug)]
pub struct CollaboratorError(Box<dyn Error + Send + Sync + 'static>);

impl CollaboratorError {
    /// Wrap any error (or message) produced by a collaborator.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self(error.into())
    }

    /// Borrow the wrapped error.
    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Unwrap into the boxed source error.
    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for CollaboratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

/// Session core errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session is active. Expected while disconnected; callers may retry
    /// once a session is established again.
    #[error("Not connected")]
    NotConnected,

    /// A session is already active
    #[error("Already connected")]
    AlreadyConnected,

    /// Connect options failed validation
    #[error("Invalid connect options: {reason}")]
    InvalidOptions { reason: String },

    /// A value from a collaborator carries no stable identifier
    #[error("Player identifier unavailable")]
    IdentifierUnavailable,

    /// A lookup matched nothing
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Failure reported by an external collaborator
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl SessionError {
    /// Whether the caller may reasonably retry the same operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    pub(crate) fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
