//! Host task container and in-memory task graph
//!
//! [`TaskContainer`] is the registration primitive the orchestrator talks
//! to: register a uniquely-named task with a configuration closure, and
//! declare dependencies between tasks. Configuration is deferred; the
//! closure runs only when the task is realised.
//!
//! [`TaskGraph`] is the in-memory container used by the CLI and tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::baseline::{FileProbe, LocalFileProbe};
use crate::task::{BaselineRef, TaskHandle, TaskSpec};

/// Deferred task configuration
pub type Configure = Box<dyn FnOnce(&mut TaskSpec) -> Result<(), TaskError> + Send>;

/// Registration primitive offered by the build host
pub trait TaskContainer: Send {
    /// Register a task under a unique name; `configure` runs on realisation
    fn register(&mut self, name: &str, configure: Configure) -> Result<TaskHandle, TaskError>;

    /// Make `task` depend on `dependency`
    fn depends_on(&mut self, task: &TaskHandle, dependency: &TaskHandle) -> Result<(), TaskError>;

    /// Whether a task with this name exists
    fn contains(&self, name: &str) -> bool;
}

enum Realisation {
    Pending(Configure),
    Configured,
    Failed(TaskError),
}

struct TaskEntry {
    spec: TaskSpec,
    state: Realisation,
}

/// In-memory task container
pub struct TaskGraph {
    entries: HashMap<String, TaskEntry>,
    /// Registration order
    order: Vec<String>,
    probe: Arc<dyn FileProbe>,
}

impl fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.order)
            .finish_non_exhaustive()
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskGraph {
    /// Create an empty graph validating inputs against the local filesystem
    pub fn new() -> Self {
        Self::with_probe(Arc::new(LocalFileProbe))
    }

    /// Create an empty graph with a custom existence probe
    pub fn with_probe(probe: Arc<dyn FileProbe>) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            probe,
        }
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Task names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// A configured task; `None` if unknown or not yet realised
    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.entries
            .get(name)
            .filter(|entry| matches!(entry.state, Realisation::Configured))
            .map(|entry| &entry.spec)
    }

    /// Dependencies of a task, realised or not
    pub fn dependencies_of(&self, name: &str) -> Option<&[TaskHandle]> {
        self.entries
            .get(name)
            .map(|entry| entry.spec.dependencies.as_slice())
    }

    /// Whether the task's configuration closure has run successfully
    pub fn is_configured(&self, name: &str) -> bool {
        self.task(name).is_some()
    }

    /// Realise a task, running its configuration closure once.
    ///
    /// A task reading a baseline that doesn't exist fails to configure.
    pub fn configure(&mut self, name: &str) -> Result<&TaskSpec, TaskError> {
        let probe = Arc::clone(&self.probe);
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

        match std::mem::replace(&mut entry.state, Realisation::Configured) {
            Realisation::Configured => {}
            Realisation::Failed(err) => {
                entry.state = Realisation::Failed(err.clone());
                return Err(err);
            }
            Realisation::Pending(configure) => {
                let result = configure(&mut entry.spec).and_then(|()| {
                    match &entry.spec.baseline {
                        Some(BaselineRef::Read(path)) if !probe.exists(path) => {
                            Err(TaskError::MissingBaseline {
                                task: name.to_string(),
                                path: path.clone(),
                            })
                        }
                        _ => Ok(()),
                    }
                });
                if let Err(err) = result {
                    entry.state = Realisation::Failed(err.clone());
                    return Err(err);
                }
                debug!(task = name, "task configured");
            }
        }

        Ok(&entry.spec)
    }

    /// Realise every task in registration order, stopping at the first error
    #[instrument(skip_all, fields(tasks = self.order.len()))]
    pub fn configure_all(&mut self) -> Result<(), TaskError> {
        let names = self.order.clone();
        for name in &names {
            self.configure(name)?;
        }
        info!(tasks = names.len(), "all tasks configured");
        Ok(())
    }

    /// Group tasks into dependency waves; wave 0 has no dependencies
    #[instrument(skip_all, fields(node_count = self.order.len()))]
    pub fn execution_waves(&self) -> Result<Vec<Vec<TaskHandle>>, TaskError> {
        let sorted = self.topological_sort()?;
        let mut wave_of: HashMap<&str, usize> = HashMap::new();

        for name in &sorted {
            let wave = self.entries[name.as_str()]
                .spec
                .dependencies
                .iter()
                .filter_map(|dep| wave_of.get(dep.name()))
                .max()
                .map(|w| w + 1)
                .unwrap_or(0);
            wave_of.insert(name.as_str(), wave);
        }

        let wave_count = wave_of.values().max().map(|w| w + 1).unwrap_or(0);
        let mut waves: Vec<Vec<TaskHandle>> = vec![Vec::new(); wave_count];
        for name in &sorted {
            waves[wave_of[name.as_str()]].push(TaskHandle::new(name.as_str()));
        }
        Ok(waves)
    }

    /// Kahn's algorithm; ties broken by registration order
    fn topological_sort(&self) -> Result<Vec<String>, TaskError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut sorted: Vec<String> = Vec::with_capacity(self.order.len());

        for name in &self.order {
            let deps = &self.entries[name.as_str()].spec.dependencies;
            in_degree.insert(name.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep.name()).or_default().push(name.as_str());
            }
            if deps.is_empty() {
                queue.push_back(name.as_str());
            }
        }

        while let Some(name) = queue.pop_front() {
            sorted.push(name.to_string());
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(*dependent);
                    }
                }
            }
        }

        if sorted.len() != self.order.len() {
            let in_sorted: HashSet<&str> = sorted.iter().map(String::as_str).collect();
            let cyclic: Vec<&str> = self
                .order
                .iter()
                .map(String::as_str)
                .filter(|name| !in_sorted.contains(name))
                .collect();
            return Err(TaskError::CyclicDependency(cyclic.join(", ")));
        }

        Ok(sorted)
    }

    /// Human-readable summary of the execution plan
    pub fn execution_plan(&self) -> Result<String, TaskError> {
        let mut plan = String::new();
        for (i, wave) in self.execution_waves()?.iter().enumerate() {
            plan.push_str(&format!("Wave {} ({} tasks):\n", i, wave.len()));
            for handle in wave {
                let deps = self.dependencies_of(handle.name()).unwrap_or_default();
                if deps.is_empty() {
                    plan.push_str(&format!("  {}\n", handle));
                } else {
                    let deps: Vec<&str> = deps.iter().map(TaskHandle::name).collect();
                    plan.push_str(&format!("  {} (after: {})\n", handle, deps.join(", ")));
                }
            }
        }
        Ok(plan)
    }
}

impl TaskContainer for TaskGraph {
    fn register(&mut self, name: &str, configure: Configure) -> Result<TaskHandle, TaskError> {
        if self.entries.contains_key(name) {
            return Err(TaskError::DuplicateTask(name.to_string()));
        }
        let spec = TaskSpec::new(name);
        let handle = spec.handle();
        self.entries.insert(
            name.to_string(),
            TaskEntry {
                spec,
                state: Realisation::Pending(configure),
            },
        );
        self.order.push(name.to_string());
        debug!(task = name, "task registered");
        Ok(handle)
    }

    fn depends_on(&mut self, task: &TaskHandle, dependency: &TaskHandle) -> Result<(), TaskError> {
        if !self.entries.contains_key(dependency.name()) {
            return Err(TaskError::UnknownTask(dependency.name().to_string()));
        }
        let entry = self
            .entries
            .get_mut(task.name())
            .ok_or_else(|| TaskError::UnknownTask(task.name().to_string()))?;

        if !entry.spec.dependencies.contains(dependency) {
            entry.spec.dependencies.push(dependency.clone());
        }
        Ok(())
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Errors raised while building or realising the task graph
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    /// A task name was registered twice
    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    /// Referenced task does not exist
    #[error("Task '{0}' not found")]
    UnknownTask(String),

    /// A baseline configured for reading does not exist
    #[error("Task '{task}' reads baseline {} which does not exist", .path.display())]
    MissingBaseline { task: String, path: PathBuf },

    /// Cyclic dependency detected
    #[error("Cyclic dependency detected among tasks: {0}")]
    CyclicDependency(String),

    /// Orchestration state was poisoned by a panicking handler
    #[error("Orchestration state is poisoned")]
    Poisoned,
}
