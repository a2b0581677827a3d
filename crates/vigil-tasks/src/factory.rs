//! Per-variant analysis and baseline creation tasks

use std::path::PathBuf;

use tracing::debug;

use vigil_core::config::VARIANT_PLACEHOLDER;
use vigil_core::{capitalize, ReportsConfig, TasksConfig, VariantDescriptor};

use crate::baseline::BaselineResolver;
use crate::graph::{TaskContainer, TaskError};
use crate::task::{BaselineRef, ReportOutput, TaskHandle, TaskKind};

/// Builds the two tasks every included variant gets
#[derive(Debug, Clone)]
pub struct VariantTaskFactory {
    tasks: TasksConfig,
    reports: ReportsConfig,
    resolver: BaselineResolver,
}

impl VariantTaskFactory {
    pub fn new(tasks: &TasksConfig, reports: &ReportsConfig, resolver: BaselineResolver) -> Self {
        Self {
            tasks: tasks.clone(),
            reports: reports.clone(),
            resolver,
        }
    }

    pub fn resolver(&self) -> &BaselineResolver {
        &self.resolver
    }

    /// `vigil` + `FreeRelease`
    pub fn analysis_task_name(&self, variant_name: &str) -> String {
        format!("{}{}", self.tasks.analysis_prefix, capitalize(variant_name))
    }

    /// `vigilBaseline` + `FreeRelease`
    pub fn baseline_task_name(&self, variant_name: &str) -> String {
        format!("{}{}", self.tasks.baseline_prefix, capitalize(variant_name))
    }

    /// Source roots (primary language, secondary language, then extra
    /// sources) and the compile classpath
    fn inputs(&self, variant: &VariantDescriptor) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut source = variant.sources.all();
        source.extend(self.tasks.extra_sources.iter().cloned());
        (source, variant.compile_classpath.clone())
    }

    /// Register the analysis task for a variant.
    ///
    /// The baseline is resolved when the task is configured and only an
    /// existing file is wired in.
    pub fn build_analysis_task(
        &self,
        variant: &VariantDescriptor,
        container: &mut dyn TaskContainer,
    ) -> Result<TaskHandle, TaskError> {
        let name = self.analysis_task_name(&variant.name);
        let (source, classpath) = self.inputs(variant);
        let description = render(&self.tasks.analysis_description, &variant.name);
        let group = self.tasks.group.clone();
        let reports: Vec<ReportOutput> = self
            .reports
            .outputs_for(&variant.name)
            .into_iter()
            .map(|(format, path)| ReportOutput { format, path })
            .collect();
        let resolver = self.resolver.clone();
        let variant_name = variant.name.clone();

        debug!(task = %name, sources = source.len(), classpath = classpath.len(), "registering analysis task");
        container.register(
            &name,
            Box::new(move |spec| {
                spec.kind = TaskKind::Analysis;
                spec.group = Some(group);
                spec.description = Some(description);
                spec.source = source;
                spec.classpath = classpath;
                spec.baseline = resolver
                    .resolve_for_analysis(&variant_name)
                    .map(BaselineRef::Read);
                spec.reports = reports;
                spec.variant = Some(variant_name);
                Ok(())
            }),
        )
    }

    /// Register the baseline creation task for a variant.
    ///
    /// Without a global baseline the task has no output file.
    pub fn build_baseline_creation_task(
        &self,
        variant: &VariantDescriptor,
        container: &mut dyn TaskContainer,
    ) -> Result<TaskHandle, TaskError> {
        let name = self.baseline_task_name(&variant.name);
        let (source, classpath) = self.inputs(variant);
        let description = render(&self.tasks.baseline_description, &variant.name);
        let group = self.tasks.group.clone();
        let target = self.resolver.resolve_for_baseline_creation(&variant.name);
        let variant_name = variant.name.clone();

        debug!(task = %name, target = ?target, "registering baseline creation task");
        container.register(
            &name,
            Box::new(move |spec| {
                spec.kind = TaskKind::CreateBaseline;
                spec.group = Some(group);
                spec.description = Some(description);
                spec.source = source;
                spec.classpath = classpath;
                spec.baseline = target.map(BaselineRef::Write);
                spec.variant = Some(variant_name);
                Ok(())
            }),
        )
    }

    /// Whether the variant's tasks end up with no source roots at all
    pub fn has_no_sources(&self, variant: &VariantDescriptor) -> bool {
        variant.sources.is_empty() && self.tasks.extra_sources.is_empty()
    }
}

fn render(template: &str, variant_name: &str) -> String {
    template.replace(VARIANT_PLACEHOLDER, variant_name)
}
