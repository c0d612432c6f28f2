//! GitLab project directory client

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use visguard_core::{ProjectDirectory, ProjectId, ProjectRecord, RemoteError, RemoteResult, Visibility};

use crate::config::{normalize_base_url, GitLabConfig};
use crate::error::GitLabError;
use crate::Result;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Project payload as returned by `GET/PUT /projects/:id`.
#[derive(Debug, Deserialize)]
struct GitLabProject {
    id: u64,
    name: String,
    #[serde(default)]
    path_with_namespace: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    visibility: Visibility,
}

impl From<GitLabProject> for ProjectRecord {
    fn from(p: GitLabProject) -> Self {
        ProjectRecord {
            id: ProjectId::from(p.id),
            name: p.name,
            path_with_namespace: p.path_with_namespace,
            web_url: p.web_url,
            visibility: p.visibility,
        }
    }
}

#[derive(Debug, Serialize)]
struct EditProject {
    visibility: Visibility,
}

/// [`ProjectDirectory`] backed by the GitLab REST API.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GitLabDirectory {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl GitLabDirectory {
    /// Build a client. Fails on a missing token, a bad URL, or when the
    /// HTTP client cannot be constructed.
    pub fn new(config: GitLabConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(GitLabError::MissingToken);
        }

        let base = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        debug!(base_url = %base, "GitLab client ready");

        Ok(GitLabDirectory {
            http,
            base,
            token: config.token,
        })
    }

    /// The normalised API root, e.g. `https://gitlab.com/api/v4/`.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/projects/{id}` with the id encoded as a single path segment,
    /// so `group/project` becomes `group%2Fproject`.
    pub fn project_url(&self, id: &ProjectId) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Other(format!("cannot build project URL from {}", self.base)))?
            .pop_if_empty()
            .push("projects")
            .push(id.as_str());
        Ok(url)
    }

    async fn decode(&self, id: &ProjectId, response: reqwest::Response) -> RemoteResult<ProjectRecord> {
        let status = response.status();
        if status.is_success() {
            let project: GitLabProject = response
                .json()
                .await
                .map_err(|e| RemoteError::Other(format!("invalid project payload: {e}")))?;
            return Ok(project.into());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, id, &body))
    }
}

impl std::fmt::Debug for GitLabDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabDirectory")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProjectDirectory for GitLabDirectory {
    #[instrument(skip(self), fields(project = %id))]
    async fn get(&self, id: &ProjectId) -> RemoteResult<ProjectRecord> {
        if id.is_empty() {
            return Err(RemoteError::NotFound {
                project: String::new(),
            });
        }

        let url = self.project_url(id)?;
        debug!(%url, "GET project");
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(transport_error)?;

        self.decode(id, response).await
    }

    #[instrument(skip(self), fields(project = %id, visibility = %visibility))]
    async fn set_visibility(
        &self,
        id: &ProjectId,
        visibility: Visibility,
    ) -> RemoteResult<ProjectRecord> {
        if id.is_empty() {
            return Err(RemoteError::NotFound {
                project: String::new(),
            });
        }

        let url = self.project_url(id)?;
        debug!(%url, "PUT project visibility");
        let response = self
            .http
            .put(url)
            .header(TOKEN_HEADER, &self.token)
            .json(&EditProject { visibility })
            .send()
            .await
            .map_err(transport_error)?;

        self.decode(id, response).await
    }
}

/// Map a non-success status to the directory error taxonomy.
fn status_error(status: StatusCode, id: &ProjectId, body: &str) -> RemoteError {
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound {
            project: id.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RemoteError::Unauthorized(format!("{status}: {}", body.trim()))
        }
        _ => RemoteError::Other(format!("{status}: {}", body.trim())),
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_decode() {
        RemoteError::Other(err.to_string())
    } else {
        RemoteError::Network(err.to_string())
    }
}
