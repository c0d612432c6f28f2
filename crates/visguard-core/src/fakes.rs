//! In-memory fakes for the directory trait (testing only)
//!
//! [`MemoryDirectory`] satisfies the [`ProjectDirectory`] contract without
//! any network, and records every call so tests can assert on side effects.
//! Per-project latency, failures and panics can be injected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::directory::{ProjectDirectory, RemoteError, RemoteResult};
use crate::domain::{ProjectId, ProjectRecord, Visibility};

#[derive(Debug, Default)]
struct Injected {
    get_failures: HashMap<String, RemoteError>,
    set_failures: HashMap<String, RemoteError>,
    delays: HashMap<String, Duration>,
    panics: Vec<String>,
}

/// In-memory project directory keyed by canonical id.
///
/// Lookups also match a record's `path_with_namespace`, like GitLab does.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: Mutex<HashMap<String, ProjectRecord>>,
    injected: Mutex<Injected>,
    get_calls: Mutex<Vec<String>>,
    set_calls: Mutex<Vec<(String, Visibility)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `(id, visibility)` pairs; names default to the id.
    pub fn with_projects<'a>(projects: impl IntoIterator<Item = (&'a str, Visibility)>) -> Self {
        let dir = Self::new();
        for (id, visibility) in projects {
            dir.insert(ProjectRecord::new(id, id, visibility));
        }
        dir
    }

    pub fn insert(&self, record: ProjectRecord) {
        let mut records = self.records.lock().unwrap();
        records.insert(record.id.as_str().to_string(), record);
    }

    /// Current visibility of a stored project.
    pub fn visibility_of(&self, id: &str) -> Option<Visibility> {
        let records = self.records.lock().unwrap();
        records.get(id).map(|r| r.visibility)
    }

    /// Make every `get` for `id` fail with `error`.
    pub fn fail_get(&self, id: &str, error: RemoteError) {
        let mut injected = self.injected.lock().unwrap();
        injected.get_failures.insert(id.to_string(), error);
    }

    /// Make every `set_visibility` for `id` fail with `error`.
    pub fn fail_set(&self, id: &str, error: RemoteError) {
        let mut injected = self.injected.lock().unwrap();
        injected.set_failures.insert(id.to_string(), error);
    }

    /// Delay each call for `id` by `delay` before answering.
    pub fn delay(&self, id: &str, delay: Duration) {
        let mut injected = self.injected.lock().unwrap();
        injected.delays.insert(id.to_string(), delay);
    }

    /// Panic inside `get` for `id`.
    pub fn panic_on(&self, id: &str) {
        let mut injected = self.injected.lock().unwrap();
        injected.panics.push(id.to_string());
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.lock().unwrap().len()
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.lock().unwrap().len()
    }

    pub fn set_calls_for(&self, id: &str) -> usize {
        self.set_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == id)
            .count()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, id: &str) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.injected.lock().unwrap().delays.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn lookup(&self, id: &str) -> RemoteResult<ProjectRecord> {
        let records = self.records.lock().unwrap();
        records
            .get(id)
            .or_else(|| {
                records
                    .values()
                    .find(|r| r.path_with_namespace.as_deref() == Some(id))
            })
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                project: id.to_string(),
            })
    }
}

#[async_trait]
impl ProjectDirectory for MemoryDirectory {
    async fn get(&self, id: &ProjectId) -> RemoteResult<ProjectRecord> {
        self.get_calls.lock().unwrap().push(id.as_str().to_string());
        self.enter(id.as_str()).await;

        let should_panic = self.injected.lock().unwrap().panics.iter().any(|p| p == id.as_str());
        if should_panic {
            self.leave();
            panic!("injected panic for project {}", id);
        }

        let injected = self.injected.lock().unwrap().get_failures.get(id.as_str()).cloned();
        let result = match injected {
            Some(err) => Err(err),
            None => self.lookup(id.as_str()),
        };
        self.leave();
        result
    }

    async fn set_visibility(
        &self,
        id: &ProjectId,
        visibility: Visibility,
    ) -> RemoteResult<ProjectRecord> {
        self.set_calls
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), visibility));
        self.enter(id.as_str()).await;

        let injected = self.injected.lock().unwrap().set_failures.get(id.as_str()).cloned();
        let result = match injected {
            Some(err) => Err(err),
            None => {
                let mut records = self.records.lock().unwrap();
                match records.get_mut(id.as_str()) {
                    Some(record) => {
                        record.visibility = visibility;
                        Ok(record.clone())
                    }
                    None => Err(RemoteError::NotFound {
                        project: id.as_str().to_string(),
                    }),
                }
            }
        };
        self.leave();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_resolves_namespaced_path() {
        let dir = MemoryDirectory::new();
        let mut record = ProjectRecord::new("17", "tools", Visibility::Private);
        record.path_with_namespace = Some("infra/tools".to_string());
        dir.insert(record);

        let found = dir.get(&ProjectId::from("infra/tools")).await.unwrap();
        assert_eq!(found.id.as_str(), "17");
    }

    #[tokio::test]
    async fn test_set_visibility_persists() {
        let dir = MemoryDirectory::with_projects([("p1", Visibility::Private)]);
        dir.set_visibility(&ProjectId::from("p1"), Visibility::Public)
            .await
            .unwrap();
        assert_eq!(dir.visibility_of("p1"), Some(Visibility::Public));
        assert_eq!(dir.set_calls_for("p1"), 1);
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let dir = MemoryDirectory::new();
        let err = dir.get(&ProjectId::from("nope")).await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::NotFound {
                project: "nope".to_string()
            }
        );
    }
}
