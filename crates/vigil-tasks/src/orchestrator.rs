//! Variant orchestration
//!
//! The [`Orchestrator`] is the handler the build host calls once per
//! discovered variant. Each call classifies and filters the variant, then
//! registers its analysis and baseline creation tasks and hangs them off the
//! matching aggregates. Calls may arrive in any order and from any thread;
//! the aggregate map, the registered-variant records and the container share
//! a single lock.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, instrument};

use vigil_core::{Config, Scope, VariantDescriptor, VariantKindTag};

use crate::aggregate::{AggregateRegistry, AggregateTask, TaskRole, VariantTaskRecord};
use crate::baseline::{BaselineResolver, FileProbe, LocalFileProbe};
use crate::classify::classify;
use crate::factory::VariantTaskFactory;
use crate::graph::{TaskContainer, TaskError};
use crate::ignore::{IgnoreFilter, IgnoreReason};
use crate::reporter::{OrchestrationEvent, OrchestrationReporter, TracingReporter};
use crate::task::TaskHandle;

/// Why a variant produced no tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Kind tag outside the main/test set
    Unclassified(VariantKindTag),
    /// Matched a deny-list
    Ignored(IgnoreReason),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unclassified(tag) => write!(f, "unclassified variant kind '{}'", tag),
            Self::Ignored(reason) => write!(f, "{}", reason),
        }
    }
}

/// Result of delivering one variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    /// Tasks were created
    Registered(VariantTaskRecord),
    /// The variant had been registered before; nothing was created
    AlreadyRegistered(VariantTaskRecord),
    /// The variant is out of scope
    Skipped(SkipReason),
}

impl VariantOutcome {
    pub fn record(&self) -> Option<&VariantTaskRecord> {
        match self {
            Self::Registered(record) | Self::AlreadyRegistered(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }
}

/// Handler invoked by a discovery source for each variant
pub type VariantHandler<'a> = dyn FnMut(&VariantDescriptor) -> Result<(), TaskError> + 'a;

/// Source of variants owned by the build host
pub trait VariantDiscovery {
    /// Deliver every variant to `handler`, stopping at the first error
    fn on_variants(&mut self, handler: &mut VariantHandler<'_>) -> Result<(), TaskError>;
}

/// Discovery over a fixed list, delivered in order
#[derive(Debug, Clone, Default)]
pub struct StaticVariants {
    variants: Vec<VariantDescriptor>,
}

impl StaticVariants {
    pub fn new(variants: Vec<VariantDescriptor>) -> Self {
        Self { variants }
    }
}

impl VariantDiscovery for StaticVariants {
    fn on_variants(&mut self, handler: &mut VariantHandler<'_>) -> Result<(), TaskError> {
        for variant in &self.variants {
            handler(variant)?;
        }
        Ok(())
    }
}

struct RunState<C> {
    container: C,
    registry: AggregateRegistry,
}

/// Registers analysis tasks for discovered variants
pub struct Orchestrator<C: TaskContainer> {
    filter: IgnoreFilter,
    factory: VariantTaskFactory,
    reporter: Arc<dyn OrchestrationReporter>,
    state: Mutex<RunState<C>>,
}

impl<C: TaskContainer> fmt::Debug for Orchestrator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("filter", &self.filter)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl<C: TaskContainer> Orchestrator<C> {
    /// Create an orchestrator checking baselines on the local filesystem and
    /// logging through tracing
    pub fn new(config: &Config, container: C) -> Self {
        Self::with_parts(
            config,
            container,
            Arc::new(LocalFileProbe),
            Arc::new(TracingReporter),
        )
    }

    /// Create an orchestrator with explicit collaborators
    pub fn with_parts(
        config: &Config,
        container: C,
        probe: Arc<dyn FileProbe>,
        reporter: Arc<dyn OrchestrationReporter>,
    ) -> Self {
        let resolver = BaselineResolver::with_probe(config.baseline.clone(), probe);
        Self {
            filter: IgnoreFilter::new(&config.ignore),
            factory: VariantTaskFactory::new(&config.tasks, &config.reports, resolver),
            reporter,
            state: Mutex::new(RunState {
                container,
                registry: AggregateRegistry::new(&config.tasks),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RunState<C>>, TaskError> {
        self.state.lock().map_err(|_| TaskError::Poisoned)
    }

    /// Subscribe to a discovery source and register every variant it delivers
    #[instrument(skip_all)]
    pub fn register_tasks(&self, discovery: &mut dyn VariantDiscovery) -> Result<(), TaskError> {
        discovery.on_variants(&mut |variant: &VariantDescriptor| {
            self.on_variant(variant).map(|_| ())
        })?;
        info!("variant discovery finished");
        Ok(())
    }

    /// Handle one discovered variant
    #[instrument(skip_all, fields(variant = %variant.name, kind = %variant.kind))]
    pub fn on_variant(&self, variant: &VariantDescriptor) -> Result<VariantOutcome, TaskError> {
        let Some(scope) = classify(variant).scope() else {
            return Ok(self.skip(variant, SkipReason::Unclassified(variant.kind)));
        };
        if let Some(reason) = self.filter.match_reason(variant) {
            return Ok(self.skip(variant, SkipReason::Ignored(reason)));
        }

        let mut state = self.lock()?;
        let RunState {
            container,
            registry,
        } = &mut *state;

        if let Some(existing) = registry.record(scope, &variant.name) {
            let existing = existing.clone();
            drop(state);
            self.reporter.report(&OrchestrationEvent::DuplicateVariant {
                variant: variant.name.clone(),
                scope,
            });
            return Ok(VariantOutcome::AlreadyRegistered(existing));
        }

        self.check_names_free(variant, scope, container, registry)?;

        let mut events = Vec::new();
        let analysis = self.factory.build_analysis_task(variant, container)?;
        let baseline = self.factory.build_baseline_creation_task(variant, container)?;

        self.attach(registry, container, TaskRole::Analysis, scope, &analysis, &mut events)?;
        self.attach(registry, container, TaskRole::Baseline, scope, &baseline, &mut events)?;

        let record = VariantTaskRecord {
            variant_name: variant.name.clone(),
            scope,
            analysis,
            baseline,
        };
        registry.insert_record(record.clone());
        drop(state);

        events.push(OrchestrationEvent::VariantRegistered {
            variant: record.variant_name.clone(),
            scope,
            analysis: record.analysis.clone(),
            baseline: record.baseline.clone(),
        });
        if self.factory.has_no_sources(variant) {
            events.push(OrchestrationEvent::EmptySources {
                variant: variant.name.clone(),
            });
        }
        if self
            .factory
            .resolver()
            .resolve_for_baseline_creation(&variant.name)
            .is_none()
        {
            events.push(OrchestrationEvent::MissingBaselineTarget {
                variant: variant.name.clone(),
                task: record.baseline.clone(),
            });
        }
        for event in &events {
            self.reporter.report(event);
        }

        Ok(VariantOutcome::Registered(record))
    }

    /// Reject the variant before registering anything if one of the names
    /// its tasks or not-yet-created aggregates need is taken.
    fn check_names_free(
        &self,
        variant: &VariantDescriptor,
        scope: Scope,
        container: &C,
        registry: &AggregateRegistry,
    ) -> Result<(), TaskError> {
        let mut names = vec![
            self.factory.analysis_task_name(&variant.name),
            self.factory.baseline_task_name(&variant.name),
        ];
        names.extend(registry.uncreated_names(scope));

        let mut seen = HashSet::new();
        for name in &names {
            if container.contains(name) || !seen.insert(name.as_str()) {
                debug!(task = %name, "task name already taken");
                return Err(TaskError::DuplicateTask(name.clone()));
            }
        }
        Ok(())
    }

    fn attach(
        &self,
        registry: &mut AggregateRegistry,
        container: &mut C,
        role: TaskRole,
        scope: Scope,
        task: &TaskHandle,
        events: &mut Vec<OrchestrationEvent>,
    ) -> Result<(), TaskError> {
        let aggregate = AggregateTask::new(role, scope);
        let created = !registry.is_created(aggregate);
        let handle = registry.ensure(aggregate, container)?;
        if created {
            events.push(OrchestrationEvent::AggregateCreated { aggregate, task: handle });
        }
        registry.attach(aggregate, task, container)?;
        Ok(())
    }

    fn skip(&self, variant: &VariantDescriptor, reason: SkipReason) -> VariantOutcome {
        debug!(reason = %reason, "skipping variant");
        self.reporter.report(&OrchestrationEvent::VariantSkipped {
            variant: variant.name.clone(),
            reason: reason.clone(),
        });
        VariantOutcome::Skipped(reason)
    }

    /// Records registered for a scope, in registration order
    pub fn records(&self, scope: Scope) -> Result<Vec<VariantTaskRecord>, TaskError> {
        Ok(self.lock()?.registry.records(scope).to_vec())
    }

    /// Dependencies attached to an aggregate, in attachment order
    pub fn aggregate_dependencies(
        &self,
        aggregate: AggregateTask,
    ) -> Result<Vec<TaskHandle>, TaskError> {
        Ok(self.lock()?.registry.dependencies(aggregate).to_vec())
    }

    /// Handle of an aggregate, if any variant has created it
    pub fn aggregate(&self, aggregate: AggregateTask) -> Result<Option<TaskHandle>, TaskError> {
        Ok(self.lock()?.registry.handle(aggregate).cloned())
    }

    /// Finish the run and hand the container back to the host
    pub fn into_container(self) -> Result<C, TaskError> {
        self.state
            .into_inner()
            .map(|state| state.container)
            .map_err(|_| TaskError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskGraph;
    use crate::reporter::CollectingReporter;
    use crate::task::{BaselineRef, TaskKind};
    use std::path::{Path, PathBuf};
    use std::sync::{OnceLock, Weak};
    use tempfile::TempDir;

    struct FakeProbe(HashSet<PathBuf>);

    impl FileProbe for FakeProbe {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }
    }

    fn orchestrator(config: &Config) -> (Orchestrator<TaskGraph>, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::default());
        let orchestrator = Orchestrator::with_parts(
            config,
            TaskGraph::new(),
            Arc::new(FakeProbe(HashSet::new())),
            reporter.clone(),
        );
        (orchestrator, reporter)
    }

    fn app(name: &str) -> VariantDescriptor {
        VariantDescriptor::new(name, VariantKindTag::Application)
            .with_kotlin_sources(vec![PathBuf::from("src/main/kotlin")])
    }

    fn names(handles: &[TaskHandle]) -> Vec<&str> {
        handles.iter().map(TaskHandle::name).collect()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut config = Config::default();
        config.ignore.build_types.insert("debug".to_string());
        let (orchestrator, _) = orchestrator(&config);

        let mut discovery = StaticVariants::new(vec![
            app("release"),
            app("debug").with_build_type("debug"),
            VariantDescriptor::new("releaseAndroidTest", VariantKindTag::Test),
        ]);
        orchestrator.register_tasks(&mut discovery).unwrap();

        assert_eq!(
            names(&orchestrator.aggregate_dependencies(AggregateTask::AnalysisMain).unwrap()),
            vec!["vigilRelease"]
        );
        assert_eq!(
            names(&orchestrator.aggregate_dependencies(AggregateTask::AnalysisTest).unwrap()),
            vec!["vigilReleaseAndroidTest"]
        );
        assert_eq!(
            names(&orchestrator.aggregate_dependencies(AggregateTask::BaselineMain).unwrap()),
            vec!["vigilBaselineRelease"]
        );

        let graph = orchestrator.into_container().unwrap();
        assert!(!graph.contains("vigilDebug"));
        assert!(!graph.contains("vigilBaselineDebug"));
    }

    #[test]
    fn test_ignored_variants_create_nothing() {
        let mut config = Config::default();
        config.ignore.variants.insert("paidRelease".to_string());
        config.ignore.flavors.insert("demo".to_string());
        let (orchestrator, _) = orchestrator(&config);

        let variants = vec![
            app("freeRelease").with_flavor("free"),
            app("paidRelease").with_flavor("paid"),
            app("demoRelease").with_flavor("demo"),
            VariantDescriptor::new("freeReleaseUnitTest", VariantKindTag::Test).with_flavor("free"),
            VariantDescriptor::new("freeLib", VariantKindTag::Library).with_flavor("free"),
        ];
        for variant in &variants {
            orchestrator.on_variant(variant).unwrap();
        }

        let graph = orchestrator.into_container().unwrap();
        let analysis = graph
            .names()
            .iter()
            .filter(|name| name.starts_with("vigil") && !name.starts_with("vigilBaseline"))
            .filter(|name| !["vigilMain", "vigilTest"].contains(&name.as_str()))
            .count();
        let baseline = graph
            .names()
            .iter()
            .filter(|name| name.starts_with("vigilBaseline"))
            .filter(|name| !["vigilBaselineMain", "vigilBaselineTest"].contains(&name.as_str()))
            .count();
        assert_eq!(analysis, 3);
        assert_eq!(baseline, 3);
        assert!(!graph.contains("vigilPaidRelease"));
        assert!(!graph.contains("vigilDemoRelease"));
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let (orchestrator, reporter) = orchestrator(&Config::default());

        let first = orchestrator.on_variant(&app("release")).unwrap();
        let second = orchestrator.on_variant(&app("release")).unwrap();

        assert!(matches!(first, VariantOutcome::Registered(_)));
        assert!(matches!(second, VariantOutcome::AlreadyRegistered(_)));
        assert_eq!(first.record(), second.record());
        assert_eq!(orchestrator.records(Scope::Main).unwrap().len(), 1);
        assert_eq!(
            orchestrator
                .aggregate_dependencies(AggregateTask::AnalysisMain)
                .unwrap()
                .len(),
            1
        );
        assert!(reporter.events().contains(&OrchestrationEvent::DuplicateVariant {
            variant: "release".to_string(),
            scope: Scope::Main,
        }));

        let graph = orchestrator.into_container().unwrap();
        assert_eq!(graph.dependencies_of("vigilMain").unwrap().len(), 1);
        // 2 aggregates + 2 variant tasks
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_aggregate_scoping() {
        let (orchestrator, _) = orchestrator(&Config::default());
        orchestrator.on_variant(&app("release")).unwrap();
        orchestrator
            .on_variant(&VariantDescriptor::new("releaseUnitTest", VariantKindTag::Test))
            .unwrap();

        let main = orchestrator.aggregate_dependencies(AggregateTask::AnalysisMain).unwrap();
        let test = orchestrator.aggregate_dependencies(AggregateTask::AnalysisTest).unwrap();
        let baseline_main = orchestrator.aggregate_dependencies(AggregateTask::BaselineMain).unwrap();

        assert_eq!(names(&main), vec!["vigilRelease"]);
        assert_eq!(names(&test), vec!["vigilReleaseUnitTest"]);
        assert!(!baseline_main.contains(&TaskHandle::new("vigilRelease")));
        assert!(!main.contains(&TaskHandle::new("vigilBaselineRelease")));
    }

    #[test]
    fn test_unclassified_variant_skipped() {
        let (orchestrator, reporter) = orchestrator(&Config::default());
        let outcome = orchestrator
            .on_variant(&VariantDescriptor::new("kmpJvm", VariantKindTag::Other))
            .unwrap();

        assert_eq!(
            outcome,
            VariantOutcome::Skipped(SkipReason::Unclassified(VariantKindTag::Other))
        );
        assert_eq!(orchestrator.aggregate(AggregateTask::AnalysisMain).unwrap(), None);
        assert_eq!(reporter.events().len(), 1);
        assert!(orchestrator.into_container().unwrap().is_empty());
    }

    #[test]
    fn test_aggregates_created_lazily() {
        let (orchestrator, reporter) = orchestrator(&Config::default());
        orchestrator.on_variant(&app("release")).unwrap();
        orchestrator.on_variant(&app("staging")).unwrap();

        assert!(orchestrator.aggregate(AggregateTask::AnalysisMain).unwrap().is_some());
        assert!(orchestrator.aggregate(AggregateTask::AnalysisTest).unwrap().is_none());

        let created = reporter
            .events()
            .iter()
            .filter(|e| matches!(e, OrchestrationEvent::AggregateCreated { .. }))
            .count();
        assert_eq!(created, 2);
    }

    #[test]
    fn test_empty_sources_and_missing_target_reported() {
        let (orchestrator, reporter) = orchestrator(&Config::default());
        orchestrator
            .on_variant(&VariantDescriptor::new("bare", VariantKindTag::Library))
            .unwrap();

        let events = reporter.events();
        assert!(events.contains(&OrchestrationEvent::EmptySources {
            variant: "bare".to_string()
        }));
        assert!(events.contains(&OrchestrationEvent::MissingBaselineTarget {
            variant: "bare".to_string(),
            task: TaskHandle::new("vigilBaselineBare"),
        }));
    }

    #[test]
    fn test_baselines_wired_from_disk() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("baseline.xml");
        std::fs::write(&global, "<SmellBaseline/>").unwrap();
        std::fs::write(temp.path().join("baseline-release.xml"), "<SmellBaseline/>").unwrap();

        let config = Config {
            baseline: Some(global.clone()),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(&config, TaskGraph::new());
        orchestrator.on_variant(&app("release")).unwrap();
        orchestrator.on_variant(&app("staging")).unwrap();

        let mut graph = orchestrator.into_container().unwrap();
        graph.configure_all().unwrap();

        assert_eq!(
            graph.task("vigilRelease").unwrap().baseline,
            Some(BaselineRef::Read(temp.path().join("baseline-release.xml")))
        );
        assert_eq!(
            graph.task("vigilStaging").unwrap().baseline,
            Some(BaselineRef::Read(global))
        );
        assert_eq!(
            graph.task("vigilBaselineStaging").unwrap().baseline,
            Some(BaselineRef::Write(temp.path().join("baseline-staging.xml")))
        );
        assert_eq!(graph.task("vigilMain").unwrap().kind, TaskKind::Aggregate);
    }

    #[test]
    fn test_delivery_order_does_not_matter() {
        let variants = vec![
            app("release"),
            VariantDescriptor::new("releaseUnitTest", VariantKindTag::Test),
            app("staging"),
        ];

        let (forward, _) = orchestrator(&Config::default());
        let (backward, _) = orchestrator(&Config::default());
        for variant in &variants {
            forward.on_variant(variant).unwrap();
        }
        for variant in variants.iter().rev() {
            backward.on_variant(variant).unwrap();
        }

        for aggregate in AggregateTask::ALL {
            let mut a = forward.aggregate_dependencies(aggregate).unwrap();
            let mut b = backward.aggregate_dependencies(aggregate).unwrap();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_concurrent_delivery() {
        let (orchestrator, _) = orchestrator(&Config::default());
        let variants: Vec<VariantDescriptor> =
            (0..16).map(|i| app(&format!("flavor{}Release", i))).collect();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for variant in &variants {
                        orchestrator.on_variant(variant).unwrap();
                    }
                });
            }
        });

        assert_eq!(orchestrator.records(Scope::Main).unwrap().len(), 16);
        assert_eq!(
            orchestrator
                .aggregate_dependencies(AggregateTask::AnalysisMain)
                .unwrap()
                .len(),
            16
        );
        let graph = orchestrator.into_container().unwrap();
        // 2 aggregates + 16 × 2 variant tasks
        assert_eq!(graph.len(), 34);
    }

    #[test]
    fn test_name_clash_with_aggregate_is_an_error() {
        let (orchestrator, _) = orchestrator(&Config::default());
        orchestrator
            .on_variant(&VariantDescriptor::new("releaseUnitTest", VariantKindTag::Test))
            .unwrap();

        // A main variant called "test" would need the task name "vigilTest"
        let err = orchestrator.on_variant(&app("test")).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateTask(name) if name == "vigilTest"));
    }

    #[test]
    fn test_rejected_variant_leaves_graph_unchanged() {
        let (orchestrator, _) = orchestrator(&Config::default());
        orchestrator.on_variant(&app("baselineRelease")).unwrap();

        // "release" needs vigilBaselineRelease, already taken by the analysis task above
        let err = orchestrator.on_variant(&app("release")).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateTask(ref name) if name == "vigilBaselineRelease"));
        let retry = orchestrator.on_variant(&app("release")).unwrap_err();
        assert!(matches!(retry, TaskError::DuplicateTask(ref name) if name == "vigilBaselineRelease"));

        assert_eq!(
            names(&orchestrator.aggregate_dependencies(AggregateTask::AnalysisMain).unwrap()),
            vec!["vigilBaselineRelease"]
        );
        assert_eq!(orchestrator.records(Scope::Main).unwrap().len(), 1);

        let graph = orchestrator.into_container().unwrap();
        assert_eq!(
            graph.names(),
            &[
                "vigilBaselineRelease".to_string(),
                "vigilBaselineBaselineRelease".to_string(),
                "vigilMain".to_string(),
                "vigilBaselineMain".to_string(),
            ]
        );
        assert!(!graph.contains("vigilRelease"));
    }

    #[test]
    fn test_variant_named_like_its_own_aggregate_registers_nothing() {
        let (orchestrator, _) = orchestrator(&Config::default());

        let err = orchestrator.on_variant(&app("main")).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateTask(ref name) if name == "vigilMain"));
        assert_eq!(orchestrator.aggregate(AggregateTask::AnalysisMain).unwrap(), None);
        assert!(orchestrator.into_container().unwrap().is_empty());
    }

    /// Records whether the run state was locked while each event was reported
    #[derive(Default)]
    struct LockObservingReporter {
        orchestrator: OnceLock<Weak<Orchestrator<TaskGraph>>>,
        locked: Mutex<Vec<bool>>,
    }

    impl OrchestrationReporter for LockObservingReporter {
        fn report(&self, _event: &OrchestrationEvent) {
            if let Some(orchestrator) = self.orchestrator.get().and_then(Weak::upgrade) {
                let locked = orchestrator.state.try_lock().is_err();
                self.locked.lock().unwrap().push(locked);
            }
        }
    }

    #[test]
    fn test_events_reported_outside_the_lock() {
        let reporter = Arc::new(LockObservingReporter::default());
        let orchestrator = Arc::new(Orchestrator::with_parts(
            &Config::default(),
            TaskGraph::new(),
            Arc::new(FakeProbe(HashSet::new())),
            reporter.clone(),
        ));
        assert!(reporter
            .orchestrator
            .set(Arc::downgrade(&orchestrator))
            .is_ok());

        orchestrator.on_variant(&app("release")).unwrap();
        orchestrator.on_variant(&app("release")).unwrap();

        let locked = reporter.locked.lock().unwrap().clone();
        // aggregate creation x2, registration, missing target, duplicate
        assert_eq!(locked.len(), 5);
        assert!(locked.iter().all(|held| !held));
    }

    #[test]
    fn test_missing_target_reported_for_unsuffixable_baseline() {
        let config = Config {
            baseline: Some(PathBuf::from("/")),
            ..Default::default()
        };
        let (orchestrator, reporter) = orchestrator(&config);
        orchestrator.on_variant(&app("release")).unwrap();

        assert!(reporter.events().contains(&OrchestrationEvent::MissingBaselineTarget {
            variant: "release".to_string(),
            task: TaskHandle::new("vigilBaselineRelease"),
        }));
    }
}
