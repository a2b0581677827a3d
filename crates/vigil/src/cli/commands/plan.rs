//! Plan command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use vigil_core::config::load_project_config;
use vigil_core::{load_manifest, Config, Scope, VariantDescriptor};
use vigil_tasks::{
    AggregateTask, CollectingReporter, LocalFileProbe, OrchestrationEvent, Orchestrator,
    ReporterSet, StaticVariants, TaskGraph, TaskHandle, TaskSpec, TracingReporter,
    VariantTaskRecord,
};

use crate::cli::output::{self, header, key_value, path_style, task_style};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes::ValidationFailed;

/// Build the analysis task graph for a list of variants
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Variant manifest (JSON, YAML or TOML)
    #[arg(long)]
    pub variants: PathBuf,

    /// Fail if any task cannot be realised
    #[arg(long)]
    pub check: bool,
}

/// An aggregate and the per-variant tasks it depends on
#[derive(Debug, Serialize)]
pub struct AggregateSummary {
    pub aggregate: AggregateTask,
    pub task: TaskHandle,
    pub dependencies: Vec<TaskHandle>,
}

/// A variant left out of the graph
#[derive(Debug, Serialize)]
pub struct SkippedVariant {
    pub variant: String,
    pub reason: String,
}

/// A task whose configuration failed
#[derive(Debug, Serialize)]
pub struct RealisationFailure {
    pub task: String,
    pub error: String,
}

/// Everything `plan` reports
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub config_path: Option<PathBuf>,
    pub registered: Vec<VariantTaskRecord>,
    pub skipped: Vec<SkippedVariant>,
    pub empty_sources: Vec<String>,
    pub aggregates: Vec<AggregateSummary>,
    pub tasks: Vec<TaskSpec>,
    pub failures: Vec<RealisationFailure>,
    pub waves: Vec<Vec<TaskHandle>>,
    #[serde(skip)]
    pub execution_plan: String,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(variants = %self.variants.display(), check = self.check, "executing plan command");
        let cwd = std::env::current_dir()?;

        let (config, config_path) = load_project_config(&cwd).context("loading configuration")?;
        let manifest = load_manifest(&self.variants)
            .with_context(|| format!("loading variants from {}", self.variants.display()))?;

        let mut report = build_plan(&config, manifest.variants)?;
        report.config_path = config_path;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => {
                if !cli.quiet {
                    print_text(&report, cli.verbose);
                }
            }
        }

        if self.check && !report.failures.is_empty() {
            return Err(ValidationFailed(report.failures.len()).into());
        }
        Ok(())
    }
}

/// Run one orchestration pass over `variants` and realise every task
pub fn build_plan(config: &Config, variants: Vec<VariantDescriptor>) -> anyhow::Result<PlanReport> {
    let collector = Arc::new(CollectingReporter::default());
    let reporters = ReporterSet::new()
        .with(Arc::new(TracingReporter))
        .with(collector.clone());

    let orchestrator = Orchestrator::with_parts(
        config,
        TaskGraph::new(),
        Arc::new(LocalFileProbe),
        Arc::new(reporters),
    );
    orchestrator.register_tasks(&mut StaticVariants::new(variants))?;

    let mut registered = orchestrator.records(Scope::Main)?;
    registered.extend(orchestrator.records(Scope::Test)?);

    let mut aggregates = Vec::new();
    for aggregate in AggregateTask::ALL {
        if let Some(task) = orchestrator.aggregate(aggregate)? {
            aggregates.push(AggregateSummary {
                aggregate,
                task,
                dependencies: orchestrator.aggregate_dependencies(aggregate)?,
            });
        }
    }

    let mut skipped = Vec::new();
    let mut empty_sources = Vec::new();
    for event in collector.events() {
        match event {
            OrchestrationEvent::VariantSkipped { variant, reason } => {
                skipped.push(SkippedVariant {
                    variant,
                    reason: reason.to_string(),
                });
            }
            OrchestrationEvent::EmptySources { variant } => empty_sources.push(variant),
            _ => {}
        }
    }

    let mut graph = orchestrator.into_container()?;
    let mut tasks = Vec::new();
    let mut failures = Vec::new();
    for name in graph.names().to_vec() {
        match graph.configure(&name) {
            Ok(spec) => tasks.push(spec.clone()),
            Err(err) => failures.push(RealisationFailure {
                task: name,
                error: err.to_string(),
            }),
        }
    }

    let waves = graph.execution_waves()?;
    let execution_plan = graph.execution_plan()?;
    info!(
        tasks = graph.len(),
        failures = failures.len(),
        waves = waves.len(),
        "plan built"
    );

    Ok(PlanReport {
        config_path: None,
        registered,
        skipped,
        empty_sources,
        aggregates,
        tasks,
        failures,
        waves,
        execution_plan,
    })
}

fn print_text(report: &PlanReport, verbose: bool) {
    println!("{}", header("Analysis Plan"));
    println!();
    if let Some(path) = &report.config_path {
        println!(
            "{}",
            key_value("Config", &path_style().apply_to(path.display()).to_string())
        );
    }
    println!(
        "{}",
        key_value("Variants", &report.registered.len().to_string())
    );
    println!("{}", key_value("Tasks", &report.tasks.len().to_string()));
    println!();

    if report.aggregates.is_empty() {
        output::warning("No variants produced analysis tasks");
    }
    for summary in &report.aggregates {
        println!(
            "{} {}",
            task_style().apply_to(&summary.task),
            style(format!("({} tasks)", summary.dependencies.len())).dim()
        );
        for dependency in &summary.dependencies {
            println!("  {} {}", style("→").blue(), dependency);
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!("{}", header("Skipped variants"));
        for skipped in &report.skipped {
            println!("  {} {}", style(&skipped.variant).dim(), skipped.reason);
        }
    }

    for variant in &report.empty_sources {
        output::warning(&format!(
            "Variant '{}' has no source directories; nothing will be analyzed",
            variant
        ));
    }

    if verbose {
        println!();
        println!("{}", header("Execution plan"));
        print!("{}", report.execution_plan);
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", style("Realisation errors:").red().bold());
        for failure in &report.failures {
            println!("  {} {}: {}", style("✗").red(), failure.task, failure.error);
        }
    } else {
        println!();
        output::success(&format!("{} tasks configured", report.tasks.len()));
    }
}
