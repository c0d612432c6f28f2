//! Remote directory abstraction.
//!
//! The [`ProjectDirectory`] trait is the only seam between the engine and
//! the service that owns project records. Implementations must be safe to
//! share across tasks; connection pooling and timeouts are their concern.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ProjectId, ProjectRecord, Visibility};

/// Result type for directory operations
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failures reported by a [`ProjectDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The project does not exist or is not visible to the caller
    #[error("project not found: {project}")]
    NotFound { project: String },

    /// Credentials were rejected or lack the required permission
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Transport failure (connect, TLS, timeout)
    #[error("network error: {0}")]
    Network(String),

    #[error("remote error: {0}")]
    Other(String),
}

/// Source of truth for project records.
///
/// One call is one logical round trip: no caching, no batching.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Fetch the current record for `id`.
    async fn get(&self, id: &ProjectId) -> RemoteResult<ProjectRecord>;

    /// Set the visibility of `id` and return the updated record.
    async fn set_visibility(
        &self,
        id: &ProjectId,
        visibility: Visibility,
    ) -> RemoteResult<ProjectRecord>;
}
