//! Per-project reconciliation errors.

use thiserror::Error;

use crate::directory::RemoteError;

/// Why a single project failed to reconcile.
///
/// These never escape the engine as `Err`; they are carried inside
/// [`ReconcileOutcome::Failed`](crate::engine::ReconcileOutcome::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Reading the current record failed
    #[error("when getting project: {0}")]
    Fetch(#[source] RemoteError),

    /// Writing the new visibility failed
    #[error("when editing project: {0}")]
    Update(#[source] RemoteError),

    /// The unit of work panicked or was cancelled before finishing
    #[error("reconciliation task aborted: {detail}")]
    Aborted { detail: String },
}

impl ReconcileError {
    /// The underlying directory error, if the failure came from the remote.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ReconcileError::Fetch(e) | ReconcileError::Update(e) => Some(e),
            ReconcileError::Aborted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_wraps_remote() {
        let err = ReconcileError::Fetch(RemoteError::NotFound {
            project: "p2".to_string(),
        });
        assert_eq!(err.to_string(), "when getting project: project not found: p2");
        assert!(matches!(err.remote(), Some(RemoteError::NotFound { .. })));
    }

    #[test]
    fn test_aborted_has_no_remote_source() {
        let err = ReconcileError::Aborted {
            detail: "panicked".to_string(),
        };
        assert!(err.remote().is_none());
    }
}
