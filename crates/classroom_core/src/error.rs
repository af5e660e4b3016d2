//! crates/classroom_core/src/error.rs
//!
//! Error kinds surfaced by the Session Store to its callers.

use crate::ports::PortError;
use crate::validation::ValidationError;

/// Shown when the backend rejects a sign-in without a readable reason.
pub const AUTH_FAILED_FALLBACK: &str = "Authentication failed";

/// Shown when the backend accepted a sign-in but its reply lacks a usable
/// token or profile.
pub const INCOMPLETE_PROFILE: &str = "The classroom service returned an incomplete profile";

/// Shown when the backend could not be reached.
pub const TRANSPORT_FALLBACK: &str = "Unable to reach the classroom service";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Malformed input, caught before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend refused the credentials (non-2xx response).
    #[error("{0}")]
    AuthenticationFailed(String),

    /// The backend could not be reached or answered with garbage.
    #[error("{0}")]
    Transport(String),

    /// The key-value store failed while committing the session.
    #[error("Could not save the session: {0}")]
    Persistence(String),

    #[error("The request timed out")]
    TimedOut,

    /// Sign-in was attempted while a session is already held.
    #[error("Already signed in; sign out first")]
    AlreadyAuthenticated,
}

impl AuthError {
    /// Classifies a failure of the sign-in transport.
    pub fn from_transport(err: PortError) -> Self {
        match err {
            PortError::Rejected { message, .. } if !message.trim().is_empty() => {
                Self::AuthenticationFailed(message)
            }
            PortError::Rejected { .. } | PortError::Unauthorized | PortError::NotFound(_) => {
                Self::AuthenticationFailed(AUTH_FAILED_FALLBACK.to_string())
            }
            PortError::TimedOut => Self::TimedOut,
            PortError::Storage(msg) => Self::Persistence(msg),
            // The server answered, but with a body we could not decode.
            PortError::Unexpected(_) => Self::AuthenticationFailed(INCOMPLETE_PROFILE.to_string()),
            PortError::Transport(_) => Self::Transport(TRANSPORT_FALLBACK.to_string()),
        }
    }

    /// Classifies a failure of the key-value store.
    pub fn from_storage(err: PortError) -> Self {
        match err {
            PortError::TimedOut => Self::TimedOut,
            PortError::Storage(msg) | PortError::Unexpected(msg) => Self::Persistence(msg),
            other => Self::Persistence(other.to_string()),
        }
    }
}
