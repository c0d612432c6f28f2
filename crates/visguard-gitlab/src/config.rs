//! GitLab client configuration

use std::time::Duration;

use reqwest::Url;

use crate::error::GitLabError;
use crate::Result;

/// API root used when no URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4/";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_SUFFIX: &str = "api/v4/";

/// GitLab connection settings
#[derive(Clone)]
pub struct GitLabConfig {
    /// Instance or API root URL; `api/v4/` is appended when missing
    pub base_url: String,
    /// Personal access token sent as `PRIVATE-TOKEN`
    pub token: String,
    /// Bound on each request, connect through body
    pub timeout: Duration,
    pub user_agent: String,
}

impl GitLabConfig {
    /// Config for gitlab.com with the given token.
    pub fn new(token: &str) -> Self {
        GitLabConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("visguard/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Point at a self-hosted instance. Blank input keeps the default.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim().to_string();
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Hand-written so the token never reaches logs.
impl std::fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Turn a configured URL into the API root.
///
/// `https://gitlab.example.com` becomes `https://gitlab.example.com/api/v4/`;
/// a URL already ending in `api/v4` only gains the trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let mut candidate = if raw.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        raw.to_string()
    };

    if !candidate.ends_with('/') {
        candidate.push('/');
    }
    if !candidate.ends_with(API_SUFFIX) {
        candidate.push_str(API_SUFFIX);
    }

    let url = Url::parse(&candidate).map_err(|e| GitLabError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GitLabError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}
