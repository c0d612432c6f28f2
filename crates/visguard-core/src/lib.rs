//! visguard Core Library
//!
//! Declarative visibility enforcement for externally-managed projects.
//!
//! ## Key Components
//!
//! - [`ProjectDirectory`]: the remote source of truth for project records
//! - [`Reconciler`]: concurrent check-and-correct engine over a batch of ids
//! - [`ReportSink`]: consumer of per-project outcomes as they complete
//!
//! In-memory fakes for the directory live in [`fakes`].

pub mod directory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod report;
pub mod telemetry;

pub use directory::{ProjectDirectory, RemoteError, RemoteResult};
pub use domain::{ParseVisibilityError, ProjectId, ProjectRecord, Visibility};
pub use engine::{
    reconcile_project, ProjectOutcome, ReconcileConfig, ReconcileOutcome, ReconcileReport,
    Reconciler,
};
pub use error::ReconcileError;
pub use report::{CollectingSink, ConsoleSink, NullSink, ReportSink};
