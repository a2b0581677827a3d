//! Task types and definitions

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use vigil_core::ReportFormat;

/// Reference to a task registered in a container
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle {
    name: String,
}

impl TaskHandle {
    /// Create a handle for a task name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Registered task name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// What a task does when executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Umbrella task with no action of its own
    #[default]
    Aggregate,
    /// Runs analysis over a variant
    Analysis,
    /// Writes a baseline for a variant
    CreateBaseline,
}

/// Baseline file wired into a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "path", rename_all = "lowercase")]
pub enum BaselineRef {
    /// Existing file read to suppress known findings
    Read(PathBuf),
    /// Output location for a baseline creation task
    Write(PathBuf),
}

impl BaselineRef {
    /// Path regardless of direction
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read(path) | Self::Write(path) => path,
        }
    }
}

/// Report output convention for an analysis task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutput {
    pub format: ReportFormat,
    pub path: PathBuf,
}

/// A task as configured in the container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Registered name
    pub name: String,

    /// Action kind
    pub kind: TaskKind,

    /// Group shown by the host
    #[serde(default)]
    pub group: Option<String>,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Variant this task was created for
    #[serde(default)]
    pub variant: Option<String>,

    /// Source roots to analyze
    #[serde(default)]
    pub source: Vec<PathBuf>,

    /// Compile classpath for type resolution
    #[serde(default)]
    pub classpath: Vec<PathBuf>,

    /// Baseline input or output
    #[serde(default)]
    pub baseline: Option<BaselineRef>,

    /// Report outputs
    #[serde(default)]
    pub reports: Vec<ReportOutput>,

    /// Tasks that run before this one, in insertion order
    #[serde(default)]
    pub dependencies: Vec<TaskHandle>,
}

impl TaskSpec {
    /// Create an unconfigured task
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Handle referring to this task
    pub fn handle(&self) -> TaskHandle {
        TaskHandle::new(&self.name)
    }
}
