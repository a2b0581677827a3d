//! Init command

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use console::style;
use tracing::info;

use vigil_core::config::{Config, DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};

use crate::cli::Cli;

/// Configuration file format written by `init`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Toml,
}

/// Write a default Vigil configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Configuration format
    #[arg(long = "config-format", default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, format = ?self.config_format, "executing init command");
        let cwd = std::env::current_dir()?;
        let config_path = self.target_path(&cwd);

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration file already exists at {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        let content = render(self.config_format)?;
        std::fs::write(&config_path, &content)
            .with_context(|| format!("writing {}", config_path.display()))?;
        info!(path = %config_path.display(), "configuration written");

        if !cli.quiet {
            println!(
                "{} Created {}",
                style("✓").green().bold(),
                style(config_path.display()).cyan()
            );
            println!();
            println!("Next steps:");
            println!("  1. Point `baseline` at your baseline file, if you have one");
            println!("  2. Run `vigil plan --variants <manifest>` to preview the task graph");
        }

        Ok(())
    }

    fn target_path(&self, cwd: &Path) -> PathBuf {
        let default_name = match self.config_format {
            ConfigFormat::Yaml => DEFAULT_CONFIG_YAML,
            ConfigFormat::Toml => DEFAULT_CONFIG_TOML,
        };
        self.output
            .clone()
            .unwrap_or_else(|| cwd.join(default_name))
    }
}

/// Default configuration in the requested format
fn render(format: ConfigFormat) -> anyhow::Result<String> {
    match format {
        ConfigFormat::Yaml => Ok(DEFAULT_CONFIG_TEMPLATE.to_string()),
        ConfigFormat::Toml => {
            let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE)?;
            Ok(toml::to_string_pretty(&config)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_template_parses_to_defaults() {
        let content = render(ConfigFormat::Yaml).unwrap();
        let config: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(config.tasks.analysis_prefix, "vigil");
        assert_eq!(config.tasks.baseline_prefix, "vigilBaseline");
        assert!(config.baseline.is_none());
    }

    #[test]
    fn test_toml_render_round_trips() {
        let content = render(ConfigFormat::Toml).unwrap();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.tasks.group, "verification");
        assert_eq!(config.reports.formats.len(), 4);
    }

    #[test]
    fn test_target_path_follows_format() {
        let cmd = InitCommand {
            force: false,
            config_format: ConfigFormat::Toml,
            output: None,
        };
        assert_eq!(
            cmd.target_path(Path::new("/project")),
            PathBuf::from("/project/vigil.toml")
        );

        let cmd = InitCommand {
            force: false,
            config_format: ConfigFormat::Yaml,
            output: Some(PathBuf::from("custom.yaml")),
        };
        assert_eq!(cmd.target_path(Path::new("/project")), PathBuf::from("custom.yaml"));
    }
}
