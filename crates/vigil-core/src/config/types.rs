//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::defaults::{
    DEFAULT_ANALYSIS_DESCRIPTION, DEFAULT_ANALYSIS_PREFIX, DEFAULT_BASELINE_DESCRIPTION,
    DEFAULT_BASELINE_PREFIX, DEFAULT_REPORTS_DIR, DEFAULT_TASK_GROUP,
};

/// Main configuration for Vigil
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global baseline file; variant overrides live next to it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PathBuf>,

    /// Variants excluded from orchestration
    pub ignore: IgnoreConfig,

    /// Task naming and wiring
    pub tasks: TasksConfig,

    /// Report output conventions
    pub reports: ReportsConfig,
}

impl Config {
    /// Resolve relative paths against the directory holding the config file
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        if let Some(baseline) = &self.baseline {
            if baseline.is_relative() {
                self.baseline = Some(base_dir.join(baseline));
            }
        }
        if self.reports.dir.is_relative() {
            self.reports.dir = base_dir.join(&self.reports.dir);
        }
        for source in &mut self.tasks.extra_sources {
            if source.is_relative() {
                *source = base_dir.join(&*source);
            }
        }
    }
}

/// Deny-lists for variants.
///
/// A variant is ignored when its name, build type or flavor is listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Ignored variant names (e.g. "freeDebug")
    pub variants: BTreeSet<String>,

    /// Ignored build types (e.g. "debug")
    pub build_types: BTreeSet<String>,

    /// Ignored flavor names (e.g. "free")
    pub flavors: BTreeSet<String>,
}

impl IgnoreConfig {
    /// Whether nothing is ignored
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty() && self.build_types.is_empty() && self.flavors.is_empty()
    }
}

/// Task naming and description configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Prefix for analysis tasks ("vigil" -> "vigilRelease", "vigilMain")
    pub analysis_prefix: String,

    /// Prefix for baseline creation tasks
    pub baseline_prefix: String,

    /// Task group shown by the host
    pub group: String,

    /// Description template for analysis tasks; `{variant}` is replaced
    pub analysis_description: String,

    /// Description template for baseline creation tasks
    pub baseline_description: String,

    /// Additional source roots appended to every variant task
    pub extra_sources: Vec<PathBuf>,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            analysis_prefix: DEFAULT_ANALYSIS_PREFIX.to_string(),
            baseline_prefix: DEFAULT_BASELINE_PREFIX.to_string(),
            group: DEFAULT_TASK_GROUP.to_string(),
            analysis_description: DEFAULT_ANALYSIS_DESCRIPTION.to_string(),
            baseline_description: DEFAULT_BASELINE_DESCRIPTION.to_string(),
            extra_sources: Vec::new(),
        }
    }
}

/// Report formats produced by analysis tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Xml,
    Html,
    Txt,
    Sarif,
    Md,
}

impl ReportFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Txt => "txt",
            Self::Sarif => "sarif",
            Self::Md => "md",
        }
    }
}

/// Report output conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory receiving `<variant>.<ext>` reports
    pub dir: PathBuf,

    /// Enabled formats
    pub formats: Vec<ReportFormat>,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            formats: vec![
                ReportFormat::Xml,
                ReportFormat::Html,
                ReportFormat::Txt,
                ReportFormat::Sarif,
            ],
        }
    }
}

impl ReportsConfig {
    /// Output location of each enabled report for a variant
    pub fn outputs_for(&self, variant_name: &str) -> Vec<(ReportFormat, PathBuf)> {
        self.formats
            .iter()
            .map(|format| {
                let file = format!("{}.{}", variant_name, format.extension());
                (*format, self.dir.join(file))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tasks_config() {
        let tasks = TasksConfig::default();
        assert_eq!(tasks.analysis_prefix, "vigil");
        assert_eq!(tasks.baseline_prefix, "vigilBaseline");
        assert_eq!(tasks.group, "verification");
        assert!(tasks.analysis_description.contains("{variant}"));
    }

    #[test]
    fn test_report_outputs_for_variant() {
        let reports = ReportsConfig {
            dir: PathBuf::from("build/reports/vigil"),
            formats: vec![ReportFormat::Xml, ReportFormat::Sarif],
        };
        let outputs = reports.outputs_for("freeRelease");
        assert_eq!(
            outputs,
            vec![
                (
                    ReportFormat::Xml,
                    PathBuf::from("build/reports/vigil/freeRelease.xml")
                ),
                (
                    ReportFormat::Sarif,
                    PathBuf::from("build/reports/vigil/freeRelease.sarif")
                ),
            ]
        );
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut config = Config {
            baseline: Some(PathBuf::from("config/baseline.xml")),
            ..Default::default()
        };
        config.tasks.extra_sources = vec![PathBuf::from("shared/src")];
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.baseline,
            Some(PathBuf::from("/project/config/baseline.xml"))
        );
        assert_eq!(config.reports.dir, PathBuf::from("/project/build/reports/vigil"));
        assert_eq!(config.tasks.extra_sources, vec![PathBuf::from("/project/shared/src")]);
    }

    #[test]
    fn test_ignore_config_from_yaml() {
        let yaml = "variants: [freeDebug]\nbuild_types: [debug, staging]\n";
        let ignore: IgnoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(ignore.variants.contains("freeDebug"));
        assert_eq!(ignore.build_types.len(), 2);
        assert!(ignore.flavors.is_empty());
        assert!(!ignore.is_empty());
    }
}
