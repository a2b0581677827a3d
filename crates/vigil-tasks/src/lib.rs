//! Vigil Tasks - variant task graph composition
//!
//! This crate turns a stream of discovered build variants into per-variant
//! analysis and baseline creation tasks, grouped under four aggregate tasks
//! per scope and role.

pub mod aggregate;
pub mod baseline;
pub mod classify;
pub mod factory;
pub mod graph;
pub mod ignore;
pub mod orchestrator;
pub mod reporter;
pub mod task;

pub use aggregate::{AggregateRegistry, AggregateTask, TaskRole, VariantTaskRecord};
pub use baseline::{variant_suffixed, BaselineResolver, FileProbe, LocalFileProbe};
pub use classify::classify;
pub use factory::VariantTaskFactory;
pub use graph::{Configure, TaskContainer, TaskError, TaskGraph};
pub use ignore::{IgnoreFilter, IgnoreReason};
pub use orchestrator::{
    Orchestrator, SkipReason, StaticVariants, VariantDiscovery, VariantHandler, VariantOutcome,
};
pub use reporter::{
    CollectingReporter, OrchestrationEvent, OrchestrationReporter, ReporterSet, TracingReporter,
};
pub use task::{BaselineRef, ReportOutput, TaskHandle, TaskKind, TaskSpec};
