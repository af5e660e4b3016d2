//! services/client/src/error.rs
//!
//! Defines the primary error type for the classroom client.

use crate::config::ConfigError;
use classroom_core::error::AuthError;
use classroom_core::feed::FeedError;
use classroom_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A sign-in failure, shown to the user as-is.
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Feed(#[from] FeedError),

    /// Represents an error from the underlying HTTP library.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The command needs a session and none is held.
    #[error("Not signed in. Run `classroom signin --email <EMAIL> --password <PASSWORD>` first.")]
    SignInRequired,
}
