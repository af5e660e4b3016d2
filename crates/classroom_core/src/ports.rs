//! crates/classroom_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! session and feed logic independent of HTTP and on-device storage.

use async_trait::async_trait;
use crate::domain::{Post, SignInResponse, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, storage).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The remote service answered with a non-success status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Request timed out")]
    TimedOut,
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable, device-scoped string storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key has never been set or was removed.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Exchanges credentials for a token and profile.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<SignInResponse>;

    /// Tells the backend the token is no longer in use.
    async fn sign_out(&self, token: &str) -> PortResult<()>;
}

#[async_trait]
pub trait FeedService: Send + Sync {
    async fn list_posts(&self) -> PortResult<Vec<Post>>;

    async fn create_post(&self, content: &str) -> PortResult<()>;

    async fn delete_post(&self, post_id: &str) -> PortResult<()>;

    async fn create_comment(&self, post_id: &str, content: &str) -> PortResult<()>;

    async fn delete_comment(&self, post_id: &str, comment_id: &str) -> PortResult<()>;

    async fn like(&self, post_id: &str) -> PortResult<()>;

    async fn unlike(&self, post_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait RosterService: Send + Sync {
    /// Lists the students enrolled in the given academic year (e.g. `"2565"`).
    async fn students_by_year(&self, year: &str) -> PortResult<Vec<UserProfile>>;
}
