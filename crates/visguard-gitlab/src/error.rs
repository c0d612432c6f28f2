//! Error types for visguard-gitlab

use thiserror::Error;

/// Errors raised while constructing a GitLab client.
///
/// Request-time failures are reported as [`visguard_core::RemoteError`].
#[derive(Error, Debug)]
pub enum GitLabError {
    /// No access token was supplied
    #[error("GITLAB_TOKEN is not set")]
    MissingToken,

    /// The base URL could not be parsed or is not http(s)
    #[error("invalid GitLab URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built
    #[error("creating GitLab client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for GitLabError {
    fn from(err: reqwest::Error) -> Self {
        GitLabError::Client(err.to_string())
    }
}
