//! Validate command

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use vigil_core::config::load_project_config;
use vigil_core::{load_manifest, Config, VariantDescriptor};

use crate::cli::{Cli, OutputFormat};
use crate::exit_codes::ValidationFailed;

/// Validate the configuration
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Also check the ignore lists against a variant manifest
    #[arg(long)]
    pub variants: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(strict = self.strict, "executing validate command");
        let cwd = std::env::current_dir()?;
        let (config_path, mut findings) = self.collect(&cwd);
        if self.strict {
            findings.errors.append(&mut findings.warnings);
        }
        let passed = findings.errors.is_empty();

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "valid": passed,
                    "config_path": config_path.as_ref().map(|p| p.to_string_lossy().to_string()),
                    "errors": findings.errors,
                    "warnings": findings.warnings
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    print_text(config_path.as_deref(), &findings, passed);
                }
            }
        }

        if !passed {
            return Err(ValidationFailed(findings.errors.len()).into());
        }
        Ok(())
    }

    fn collect(&self, cwd: &Path) -> (Option<PathBuf>, Findings) {
        let mut findings = Findings::default();

        let (config, config_path) = match load_project_config(cwd) {
            Ok(loaded) => loaded,
            Err(e) => {
                findings.errors.push(format!("Configuration: {}", e));
                return (None, findings);
            }
        };
        if config_path.is_none() {
            findings
                .warnings
                .push("No configuration file found; defaults apply".to_string());
        }

        if let Some(baseline) = &config.baseline {
            if !baseline.is_file() {
                findings.warnings.push(format!(
                    "Baseline {} does not exist yet; analysis runs without it",
                    baseline.display()
                ));
            }
        }

        if let Some(manifest_path) = &self.variants {
            match load_manifest(manifest_path) {
                Ok(manifest) => check_ignore_lists(&config, &manifest.variants, &mut findings),
                Err(e) => findings.errors.push(format!("Variants: {}", e)),
            }
        }

        (config_path, findings)
    }
}

/// Warn about deny-list entries that match no known variant
fn check_ignore_lists(config: &Config, variants: &[VariantDescriptor], findings: &mut Findings) {
    let ignore = &config.ignore;
    for name in &ignore.variants {
        if !variants.iter().any(|v| &v.name == name) {
            findings
                .warnings
                .push(format!("ignore.variants: '{}' matches no variant", name));
        }
    }
    for build_type in &ignore.build_types {
        if !variants
            .iter()
            .any(|v| v.build_type.as_ref() == Some(build_type))
        {
            findings
                .warnings
                .push(format!("ignore.build_types: '{}' matches no variant", build_type));
        }
    }
    for flavor in &ignore.flavors {
        if !variants
            .iter()
            .any(|v| v.flavor_name.as_ref() == Some(flavor))
        {
            findings
                .warnings
                .push(format!("ignore.flavors: '{}' matches no variant", flavor));
        }
    }
}

fn print_text(config_path: Option<&Path>, findings: &Findings, passed: bool) {
    println!("{}", style("Validation Results").bold());
    println!();

    if let Some(path) = config_path {
        println!("Config: {}", style(path.display()).cyan());
        println!();
    }

    if !findings.errors.is_empty() {
        println!("{}", style("Errors:").red().bold());
        for error in &findings.errors {
            println!("  {} {}", style("✗").red(), error);
        }
        println!();
    }

    if !findings.warnings.is_empty() {
        println!("{}", style("Warnings:").yellow().bold());
        for warning in &findings.warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
        println!();
    }

    if passed {
        if findings.warnings.is_empty() {
            println!("{}", style("✓ All checks passed").green().bold());
        } else {
            println!(
                "{} with {} warning(s)",
                style("✓ Validation passed").green().bold(),
                findings.warnings.len()
            );
        }
    } else {
        println!(
            "{} with {} error(s)",
            style("✗ Validation failed").red().bold(),
            findings.errors.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vigil_core::VariantKindTag;

    fn command(variants: Option<PathBuf>) -> ValidateCommand {
        ValidateCommand {
            variants,
            strict: false,
        }
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vigil.yaml");
        std::fs::write(&path, "tasks:\n  analysis_prefix: vigil\n  baseline_prefix: vigil\n")
            .unwrap();

        let (config_path, findings) = command(None).collect(temp.path());
        assert!(config_path.is_none());
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.errors[0].contains("tasks.baseline_prefix"));
    }

    #[test]
    fn test_missing_config_and_baseline_are_warnings() {
        let temp = TempDir::new().unwrap();
        let (config_path, findings) = command(None).collect(temp.path());
        assert!(config_path.is_none());
        assert!(findings.errors.is_empty());
        assert_eq!(findings.warnings.len(), 1);

        let path = temp.path().join("vigil.yaml");
        std::fs::write(&path, "baseline: config/baseline.xml\n").unwrap();
        let (config_path, findings) = command(None).collect(temp.path());
        assert_eq!(config_path, Some(path));
        assert!(findings.errors.is_empty());
        assert_eq!(findings.warnings.len(), 1);
        assert!(findings.warnings[0].contains("baseline.xml"));
    }

    #[test]
    fn test_unreadable_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        let (_, findings) = command(Some(temp.path().join("missing.json"))).collect(temp.path());
        assert_eq!(findings.errors.len(), 1);
    }

    #[test]
    fn test_stale_ignore_entries() {
        let mut config = Config::default();
        config.ignore.variants.insert("freeDebug".to_string());
        config.ignore.build_types.insert("debug".to_string());
        config.ignore.flavors.insert("paid".to_string());

        let variants = vec![
            VariantDescriptor::new("freeDebug", VariantKindTag::Application)
                .with_build_type("debug")
                .with_flavor("free"),
        ];
        let mut findings = Findings::default();
        check_ignore_lists(&config, &variants, &mut findings);

        assert_eq!(
            findings.warnings,
            vec!["ignore.flavors: 'paid' matches no variant".to_string()]
        );
    }
}
