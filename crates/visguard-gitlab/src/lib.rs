//! visguard-gitlab: GitLab REST API v4 project directory
//!
//! Implements [`visguard_core::ProjectDirectory`] over `GET /projects/:id`
//! and `PUT /projects/:id`, authenticating with a personal access token.

mod client;
mod config;
mod error;

pub use client::GitLabDirectory;
pub use config::{normalize_base_url, GitLabConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::GitLabError;

/// Result type for client construction
pub type Result<T> = std::result::Result<T, GitLabError>;
