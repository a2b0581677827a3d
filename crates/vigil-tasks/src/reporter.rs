//! Orchestration event reporting

use std::sync::{Arc, Mutex};

use vigil_core::Scope;

use crate::aggregate::AggregateTask;
use crate::orchestrator::SkipReason;
use crate::task::TaskHandle;

/// Events emitted while variants are registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationEvent {
    /// A variant was left out of orchestration
    VariantSkipped { variant: String, reason: SkipReason },
    /// Tasks were created for a variant
    VariantRegistered {
        variant: String,
        scope: Scope,
        analysis: TaskHandle,
        baseline: TaskHandle,
    },
    /// A variant was delivered again after registration
    DuplicateVariant { variant: String, scope: Scope },
    /// An aggregate task was created on first use
    AggregateCreated {
        aggregate: AggregateTask,
        task: TaskHandle,
    },
    /// The variant declares no source roots; its tasks analyze nothing
    EmptySources { variant: String },
    /// No global baseline is configured, so baseline creation has no target
    MissingBaselineTarget { variant: String, task: TaskHandle },
}

/// Trait for reporting orchestration progress
pub trait OrchestrationReporter: Send + Sync {
    /// Handle an orchestration event
    fn report(&self, event: &OrchestrationEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl OrchestrationReporter for TracingReporter {
    fn report(&self, event: &OrchestrationEvent) {
        match event {
            OrchestrationEvent::VariantSkipped { variant, reason } => {
                tracing::debug!(variant = %variant, "variant skipped: {}", reason);
            }
            OrchestrationEvent::VariantRegistered {
                variant,
                scope,
                analysis,
                baseline,
            } => {
                tracing::info!(
                    variant = %variant,
                    scope = %scope,
                    analysis = %analysis,
                    baseline = %baseline,
                    "variant tasks registered"
                );
            }
            OrchestrationEvent::DuplicateVariant { variant, scope } => {
                tracing::debug!(variant = %variant, scope = %scope, "variant already registered");
            }
            OrchestrationEvent::AggregateCreated { aggregate, task } => {
                tracing::debug!(aggregate = %aggregate, task = %task, "aggregate created");
            }
            OrchestrationEvent::EmptySources { variant } => {
                tracing::warn!(variant = %variant, "variant has no source directories, nothing will be analyzed");
            }
            OrchestrationEvent::MissingBaselineTarget { variant, task } => {
                tracing::debug!(
                    variant = %variant,
                    task = %task,
                    "no baseline configured, baseline creation has no output file"
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<OrchestrationEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<OrchestrationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl OrchestrationReporter for CollectingReporter {
    fn report(&self, event: &OrchestrationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several reporters
#[derive(Default)]
pub struct ReporterSet {
    reporters: Vec<Arc<dyn OrchestrationReporter>>,
}

impl ReporterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn OrchestrationReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl OrchestrationReporter for ReporterSet {
    fn report(&self, event: &OrchestrationEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}
