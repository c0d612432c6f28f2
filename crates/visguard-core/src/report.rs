//! Report sinks: consumers of per-project outcomes.
//!
//! The engine hands each [`ProjectOutcome`] to a sink the moment its unit
//! of work finishes, so output is streamed in completion order rather than
//! buffered until the batch is done.

use std::io::Write;

use tracing::{debug, warn};

use crate::engine::{ProjectOutcome, ReconcileOutcome};

/// Consumer of reconciliation outcomes.
pub trait ReportSink: Send {
    fn record(&mut self, outcome: &ProjectOutcome);
}

/// Discards every outcome.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn record(&mut self, _outcome: &ProjectOutcome) {}
}

/// Keeps outcomes in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub outcomes: Vec<ProjectOutcome>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportSink for CollectingSink {
    fn record(&mut self, outcome: &ProjectOutcome) {
        self.outcomes.push(outcome.clone());
    }
}

/// Renders one line per updated project to `out`.
///
/// Failures go to the log at `warn`, unchanged projects at `debug`; neither
/// writes to `out`.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ReportSink for ConsoleSink<W> {
    fn record(&mut self, outcome: &ProjectOutcome) {
        match &outcome.outcome {
            ReconcileOutcome::Updated { record, .. } => {
                // Single write per line keeps concurrent output unbroken.
                let line = format!("Updated project {}\n", record.name);
                if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
                    warn!(error = %e, project = %outcome.project, "failed to write report line");
                }
            }
            ReconcileOutcome::Unchanged { record } => {
                debug!(project = %outcome.project, name = %record.name, "unchanged");
            }
            ReconcileOutcome::Failed { error } => {
                warn!(project = %outcome.project, error = %error, "project not reconciled");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::RemoteError;
    use crate::domain::{ProjectId, ProjectRecord, Visibility};
    use crate::error::ReconcileError;

    fn updated(id: &str, name: &str) -> ProjectOutcome {
        ProjectOutcome {
            project: ProjectId::from(id),
            outcome: ReconcileOutcome::Updated {
                previous: Visibility::Private,
                record: ProjectRecord::new(id, name, Visibility::Public),
            },
        }
    }

    #[test]
    fn test_console_sink_prints_only_updated_projects() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.record(&updated("1", "alpha"));
        sink.record(&ProjectOutcome {
            project: ProjectId::from("2"),
            outcome: ReconcileOutcome::Unchanged {
                record: ProjectRecord::new("2", "beta", Visibility::Public),
            },
        });
        sink.record(&ProjectOutcome {
            project: ProjectId::from("3"),
            outcome: ReconcileOutcome::Failed {
                error: ReconcileError::Fetch(RemoteError::NotFound {
                    project: "3".to_string(),
                }),
            },
        });
        sink.record(&updated("4", "delta"));

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Updated project alpha\nUpdated project delta\n");
    }

    #[test]
    fn test_collecting_sink_preserves_arrival_order() {
        let mut sink = CollectingSink::new();
        sink.record(&updated("b", "beta"));
        sink.record(&updated("a", "alpha"));
        let ids: Vec<_> = sink.outcomes.iter().map(|o| o.project.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
