//! Umbrella tasks grouping per-variant tasks by scope

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use vigil_core::{Scope, TasksConfig};

use crate::graph::{TaskContainer, TaskError};
use crate::task::{TaskHandle, TaskKind};

/// Which per-variant task an aggregate collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskRole {
    Analysis,
    Baseline,
}

/// The four umbrella tasks of an orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateTask {
    AnalysisMain,
    AnalysisTest,
    BaselineMain,
    BaselineTest,
}

impl AggregateTask {
    /// All aggregates in a stable order
    pub const ALL: [AggregateTask; 4] = [
        Self::AnalysisMain,
        Self::AnalysisTest,
        Self::BaselineMain,
        Self::BaselineTest,
    ];

    /// Aggregate collecting `role` tasks of `scope`
    pub fn new(role: TaskRole, scope: Scope) -> Self {
        match (role, scope) {
            (TaskRole::Analysis, Scope::Main) => Self::AnalysisMain,
            (TaskRole::Analysis, Scope::Test) => Self::AnalysisTest,
            (TaskRole::Baseline, Scope::Main) => Self::BaselineMain,
            (TaskRole::Baseline, Scope::Test) => Self::BaselineTest,
        }
    }

    pub fn role(self) -> TaskRole {
        match self {
            Self::AnalysisMain | Self::AnalysisTest => TaskRole::Analysis,
            Self::BaselineMain | Self::BaselineTest => TaskRole::Baseline,
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Self::AnalysisMain | Self::BaselineMain => Scope::Main,
            Self::AnalysisTest | Self::BaselineTest => Scope::Test,
        }
    }

    /// Registered name, e.g. `vigilMain` or `vigilBaselineTest`
    pub fn task_name(self, tasks: &TasksConfig) -> String {
        let prefix = match self.role() {
            TaskRole::Analysis => &tasks.analysis_prefix,
            TaskRole::Baseline => &tasks.baseline_prefix,
        };
        format!("{}{}", prefix, self.scope().suffix())
    }

    /// Fixed description shown by the host
    pub fn description(self) -> String {
        let noun = self.scope().noun();
        match self.role() {
            TaskRole::Analysis => format!(
                "EXPERIMENTAL: Run analysis for {} classes across all variants with type resolution",
                noun
            ),
            TaskRole::Baseline => format!(
                "EXPERIMENTAL: Creates baseline files for {} classes across all variants with type resolution",
                noun
            ),
        }
    }
}

impl fmt::Display for AggregateTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AnalysisMain => "analysis-main",
            Self::AnalysisTest => "analysis-test",
            Self::BaselineMain => "baseline-main",
            Self::BaselineTest => "baseline-test",
        };
        write!(f, "{}", s)
    }
}

/// The pair of tasks created for one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantTaskRecord {
    pub variant_name: String,
    pub scope: Scope,
    pub analysis: TaskHandle,
    pub baseline: TaskHandle,
}

#[derive(Debug)]
struct AggregateEntry {
    handle: TaskHandle,
    /// Insertion-ordered dependency set
    dependencies: Vec<TaskHandle>,
    seen: HashSet<TaskHandle>,
}

/// Memoised aggregate tasks and the variant records attached to them
#[derive(Debug)]
pub struct AggregateRegistry {
    tasks: TasksConfig,
    aggregates: HashMap<AggregateTask, AggregateEntry>,
    records: BTreeMap<Scope, Vec<VariantTaskRecord>>,
    registered: HashSet<(Scope, String)>,
}

impl AggregateRegistry {
    pub fn new(tasks: &TasksConfig) -> Self {
        Self {
            tasks: tasks.clone(),
            aggregates: HashMap::new(),
            records: BTreeMap::new(),
            registered: HashSet::new(),
        }
    }

    /// Whether the aggregate has been created in this run
    pub fn is_created(&self, aggregate: AggregateTask) -> bool {
        self.aggregates.contains_key(&aggregate)
    }

    /// Names the scope's aggregates will take once created
    pub fn uncreated_names(&self, scope: Scope) -> Vec<String> {
        AggregateTask::ALL
            .into_iter()
            .filter(|aggregate| aggregate.scope() == scope && !self.is_created(*aggregate))
            .map(|aggregate| aggregate.task_name(&self.tasks))
            .collect()
    }

    /// Handle of an aggregate, if created
    pub fn handle(&self, aggregate: AggregateTask) -> Option<&TaskHandle> {
        self.aggregates.get(&aggregate).map(|entry| &entry.handle)
    }

    /// Create the aggregate on first use; later calls return the same handle
    pub fn ensure(
        &mut self,
        aggregate: AggregateTask,
        container: &mut dyn TaskContainer,
    ) -> Result<TaskHandle, TaskError> {
        if let Some(entry) = self.aggregates.get(&aggregate) {
            return Ok(entry.handle.clone());
        }

        let name = aggregate.task_name(&self.tasks);
        let group = self.tasks.group.clone();
        let description = aggregate.description();
        let handle = container.register(
            &name,
            Box::new(move |spec| {
                spec.kind = TaskKind::Aggregate;
                spec.group = Some(group);
                spec.description = Some(description);
                Ok(())
            }),
        )?;

        info!(aggregate = %aggregate, task = %handle, "aggregate task created");
        self.aggregates.insert(
            aggregate,
            AggregateEntry {
                handle: handle.clone(),
                dependencies: Vec::new(),
                seen: HashSet::new(),
            },
        );
        Ok(handle)
    }

    /// Add `task` as a dependency of the aggregate, creating it if needed.
    ///
    /// Returns `false` when the edge already existed.
    pub fn attach(
        &mut self,
        aggregate: AggregateTask,
        task: &TaskHandle,
        container: &mut dyn TaskContainer,
    ) -> Result<bool, TaskError> {
        let handle = self.ensure(aggregate, container)?;
        let entry = self
            .aggregates
            .get_mut(&aggregate)
            .ok_or_else(|| TaskError::UnknownTask(handle.name().to_string()))?;

        if entry.seen.contains(task) {
            debug!(aggregate = %aggregate, task = %task, "dependency already attached");
            return Ok(false);
        }

        container.depends_on(&handle, task)?;
        entry.seen.insert(task.clone());
        entry.dependencies.push(task.clone());
        debug!(aggregate = %aggregate, task = %task, "dependency attached");
        Ok(true)
    }

    /// Dependencies of an aggregate in attachment order
    pub fn dependencies(&self, aggregate: AggregateTask) -> &[TaskHandle] {
        self.aggregates
            .get(&aggregate)
            .map(|entry| entry.dependencies.as_slice())
            .unwrap_or_default()
    }

    /// Record registered for a variant in a scope
    pub fn record(&self, scope: Scope, variant_name: &str) -> Option<&VariantTaskRecord> {
        if !self.registered.contains(&(scope, variant_name.to_string())) {
            return None;
        }
        self.records
            .get(&scope)?
            .iter()
            .find(|record| record.variant_name == variant_name)
    }

    /// Store a new variant record; returns `false` if one already exists
    pub fn insert_record(&mut self, record: VariantTaskRecord) -> bool {
        if !self
            .registered
            .insert((record.scope, record.variant_name.clone()))
        {
            return false;
        }
        self.records.entry(record.scope).or_default().push(record);
        true
    }

    /// Records of a scope in registration order
    pub fn records(&self, scope: Scope) -> &[VariantTaskRecord] {
        self.records
            .get(&scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
