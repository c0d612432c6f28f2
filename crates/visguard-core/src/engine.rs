//! Concurrent reconciliation engine.
//!
//! [`Reconciler`] fans out one task per project id onto a [`JoinSet`],
//! forwards each outcome to a [`ReportSink`] as soon as its task finishes,
//! and returns a [`ReconcileReport`] only after the set has drained. The
//! drain loop is the join barrier: the report cannot be produced while any
//! unit of work is still in flight, and every input id gets exactly one
//! terminal outcome, including ids whose task panicked.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Serialize, Serializer};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::directory::ProjectDirectory;
use crate::domain::{ProjectId, ProjectRecord, Visibility};
use crate::error::ReconcileError;
use crate::report::{NullSink, ReportSink};

/// Engine tuning.
#[derive(Debug, Clone, Default)]
pub struct ReconcileConfig {
    /// Upper bound on in-flight units of work. `None` (or `Some(0)`) means
    /// one concurrent task per id with no cap.
    pub max_concurrent: Option<usize>,
}

impl ReconcileConfig {
    pub fn bounded(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: Some(max_concurrent),
        }
    }
}

/// Terminal outcome for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Already at the target visibility; no write was issued.
    Unchanged { record: ProjectRecord },
    /// Visibility was changed from `previous`; `record` is the remote's new state.
    Updated {
        previous: Visibility,
        record: ProjectRecord,
    },
    Failed {
        #[serde(serialize_with = "serialize_error")]
        error: ReconcileError,
    },
}

fn serialize_error<S: Serializer>(error: &ReconcileError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// An outcome paired with the id it was requested for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOutcome {
    pub project: ProjectId,
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
}

impl ProjectOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Updated { .. })
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Unchanged { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Failed { .. })
    }

    /// The record seen or produced by the directory, if the project was reached.
    pub fn record(&self) -> Option<&ProjectRecord> {
        match &self.outcome {
            ReconcileOutcome::Unchanged { record } | ReconcileOutcome::Updated { record, .. } => {
                Some(record)
            }
            ReconcileOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        match &self.outcome {
            ReconcileOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Result of one engine invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub run_id: Uuid,
    pub target: Visibility,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per input id, in input order.
    pub outcomes: Vec<ProjectOutcome>,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn updated(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.outcomes.iter().filter(|o| o.is_updated())
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.outcomes.iter().filter(|o| o.is_unchanged())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.is_failed())
    }
}

/// Reconciles project visibility against a [`ProjectDirectory`].
pub struct Reconciler {
    directory: Arc<dyn ProjectDirectory>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(directory: Arc<dyn ProjectDirectory>) -> Self {
        Self::with_config(directory, ReconcileConfig::default())
    }

    pub fn with_config(directory: Arc<dyn ProjectDirectory>, config: ReconcileConfig) -> Self {
        Self { directory, config }
    }

    /// Reconcile `ids` to `target` and return the completed report.
    pub async fn reconcile(&self, ids: Vec<ProjectId>, target: Visibility) -> ReconcileReport {
        self.reconcile_with_sink(ids, target, &mut NullSink).await
    }

    /// Reconcile `ids` to `target`, streaming each outcome into `sink` in
    /// completion order.
    ///
    /// Duplicate ids are reconciled independently. Per-project failures are
    /// reported as [`ReconcileOutcome::Failed`] and never abort siblings.
    #[instrument(skip_all, fields(visibility = %target, projects = ids.len()))]
    pub async fn reconcile_with_sink(
        &self,
        ids: Vec<ProjectId>,
        target: Visibility,
        sink: &mut dyn ReportSink,
    ) -> ReconcileReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "Reconciling {} projects to {}", ids.len(), target);

        let semaphore = self
            .config
            .max_concurrent
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));

        let mut join_set = JoinSet::new();
        for (idx, id) in ids.iter().cloned().enumerate() {
            let directory = Arc::clone(&self.directory);
            let semaphore = semaphore.clone();

            join_set.spawn(async move {
                let _permit = match semaphore {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };

                let outcome = AssertUnwindSafe(reconcile_project(directory.as_ref(), &id, target))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| ReconcileOutcome::Failed {
                        error: ReconcileError::Aborted {
                            detail: panic_message(panic.as_ref()),
                        },
                    });
                (idx, outcome)
            });
        }

        let mut slots: Vec<Option<ReconcileOutcome>> = vec![None; ids.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    let finished = ProjectOutcome {
                        project: ids[idx].clone(),
                        outcome,
                    };
                    sink.record(&finished);
                    slots[idx] = Some(finished.outcome);
                }
                Err(e) => warn!(error = %e, "reconciliation task failed to join"),
            }
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for (id, slot) in ids.into_iter().zip(slots) {
            let finished = match slot {
                Some(outcome) => ProjectOutcome {
                    project: id,
                    outcome,
                },
                None => {
                    let aborted = ProjectOutcome {
                        project: id,
                        outcome: ReconcileOutcome::Failed {
                            error: ReconcileError::Aborted {
                                detail: "task cancelled before completion".to_string(),
                            },
                        },
                    };
                    sink.record(&aborted);
                    aborted
                }
            };
            outcomes.push(finished);
        }

        let report = ReconcileReport {
            run_id,
            target,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            %run_id,
            updated = report.updated().count(),
            unchanged = report.unchanged().count(),
            failed = report.failed().count(),
            "Reconciliation finished"
        );

        report
    }
}

/// Check one project and correct its visibility if it differs from `target`.
///
/// The read always precedes the conditional write. The write targets the
/// canonical id returned by the read, not the requested identifier.
/// Failures are logged at debug only; surfacing them is the sink's job.
#[instrument(skip(directory), fields(project = %id, visibility = %target))]
pub async fn reconcile_project(
    directory: &dyn ProjectDirectory,
    id: &ProjectId,
    target: Visibility,
) -> ReconcileOutcome {
    let current = match directory.get(id).await {
        Ok(record) => record,
        Err(e) => {
            debug!(error = %e, "failed to fetch project");
            return ReconcileOutcome::Failed {
                error: ReconcileError::Fetch(e),
            };
        }
    };

    if current.visibility == target {
        debug!(name = %current.name, "visibility already matches");
        return ReconcileOutcome::Unchanged { record: current };
    }

    let previous = current.visibility;
    match directory.set_visibility(&current.id, target).await {
        Ok(record) => {
            info!(name = %record.name, from = %previous, to = %record.visibility, "visibility updated");
            ReconcileOutcome::Updated { previous, record }
        }
        Err(e) => {
            debug!(error = %e, "failed to update project visibility");
            ReconcileOutcome::Failed {
                error: ReconcileError::Update(e),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unit of work panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryDirectory;

    #[tokio::test]
    async fn test_reconcile_project_skips_write_when_matching() {
        let dir = MemoryDirectory::new();
        dir.insert(ProjectRecord::new("p1", "alpha", Visibility::Public));

        let outcome = reconcile_project(&dir, &ProjectId::from("p1"), Visibility::Public).await;

        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        assert_eq!(dir.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_project_records_previous_visibility() {
        let dir = MemoryDirectory::new();
        dir.insert(ProjectRecord::new("p1", "alpha", Visibility::Internal));

        let outcome = reconcile_project(&dir, &ProjectId::from("p1"), Visibility::Private).await;

        match outcome {
            ReconcileOutcome::Updated { previous, record } => {
                assert_eq!(previous, Visibility::Internal);
                assert_eq!(record.visibility, Visibility::Private);
            }
            other => panic!("expected Updated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_failure_is_reported_as_update_error() {
        let dir = MemoryDirectory::new();
        dir.insert(ProjectRecord::new("p1", "alpha", Visibility::Private));
        dir.fail_set("p1", crate::RemoteError::Unauthorized("read-only token".to_string()));

        let outcome = reconcile_project(&dir, &ProjectId::from("p1"), Visibility::Public).await;

        match outcome {
            ReconcileOutcome::Failed { error } => {
                assert!(matches!(error, ReconcileError::Update(_)));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let reconciler = Reconciler::new(Arc::new(MemoryDirectory::new()));
        let report = reconciler.reconcile(vec![], Visibility::Public).await;
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
    }

    #[test]
    fn test_panic_message_extracts_str_and_string() {
        let a: Box<dyn Any + Send> = Box::new("boom");
        let b: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let c: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(a.as_ref()), "boom");
        assert_eq!(panic_message(b.as_ref()), "bang");
        assert_eq!(panic_message(c.as_ref()), "unit of work panicked");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = ProjectOutcome {
            project: ProjectId::from("p1"),
            outcome: ReconcileOutcome::Updated {
                previous: Visibility::Private,
                record: ProjectRecord::new("1", "alpha", Visibility::Public),
            },
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["project"], "p1");
        assert_eq!(v["status"], "updated");
        assert_eq!(v["previous"], "private");
        assert_eq!(v["record"]["visibility"], "public");
    }
}
