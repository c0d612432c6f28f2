//! Domain types shared by the engine and directory implementations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier naming a project in the remote directory.
///
/// Either a numeric id (`"42"`) or a namespaced path (`"group/project"`).
/// No validation happens here; an empty id is passed through and left to
/// the directory to reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        ProjectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        ProjectId(s.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        ProjectId(s)
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        ProjectId(id.to_string())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility level of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Internal,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a visibility level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown visibility level: {0:?} (expected private, internal or public)")]
pub struct ParseVisibilityError(pub String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "internal" => Ok(Visibility::Internal),
            "public" => Ok(Visibility::Public),
            _ => Err(ParseVisibilityError(s.to_string())),
        }
    }
}

/// The directory's current view of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Canonical id as reported by the directory.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Full namespaced path, when the directory reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_with_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    pub visibility: Visibility,
}

impl ProjectRecord {
    pub fn new(id: impl Into<ProjectId>, name: &str, visibility: Visibility) -> Self {
        ProjectRecord {
            id: id.into(),
            name: name.to_string(),
            path_with_namespace: None,
            web_url: None,
            visibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_parses_case_insensitively() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!(" Internal ".parse::<Visibility>().unwrap(), Visibility::Internal);
        assert_eq!("PRIVATE".parse::<Visibility>().unwrap(), Visibility::Private);
    }

    #[test]
    fn test_unknown_visibility_is_rejected() {
        let err = "secret".parse::<Visibility>().unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_visibility_serializes_lowercase() {
        let json = serde_json::to_string(&Visibility::Internal).unwrap();
        assert_eq!(json, "\"internal\"");
    }

    #[test]
    fn test_project_id_from_numeric() {
        let id = ProjectId::from(42u64);
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_empty_project_id_is_preserved() {
        let id = ProjectId::from("");
        assert!(id.is_empty());
    }
}
