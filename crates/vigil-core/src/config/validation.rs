//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::defaults::VARIANT_PLACEHOLDER;
use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_tasks(config)?;
    validate_reports(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_tasks(config: &Config) -> Result<()> {
    let tasks = &config.tasks;
    validate_prefix("tasks.analysis_prefix", &tasks.analysis_prefix)?;
    validate_prefix("tasks.baseline_prefix", &tasks.baseline_prefix)?;

    if tasks.analysis_prefix == tasks.baseline_prefix {
        return Err(ConfigError::InvalidValue {
            field: "tasks.baseline_prefix".to_string(),
            message: "must differ from tasks.analysis_prefix".to_string(),
        }
        .into());
    }

    if tasks.group.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "tasks.group".to_string(),
            message: "group cannot be empty".to_string(),
        }
        .into());
    }

    for (field, template) in [
        ("tasks.analysis_description", &tasks.analysis_description),
        ("tasks.baseline_description", &tasks.baseline_description),
    ] {
        if !template.contains(VARIANT_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: format!("must contain {} placeholder", VARIANT_PLACEHOLDER),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_prefix(field: &str, prefix: &str) -> Result<()> {
    let mut chars = prefix.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!(
                "'{}' must start with a letter and contain only letters, digits or '_'",
                prefix
            ),
        }
        .into());
    }
    Ok(())
}

fn validate_reports(config: &Config) -> Result<()> {
    let formats = &config.reports.formats;
    for (i, format) in formats.iter().enumerate() {
        if formats[..i].contains(format) {
            return Err(ConfigError::InvalidValue {
                field: format!("reports.formats[{}]", i),
                message: format!("duplicate report format '{}'", format.extension()),
            }
            .into());
        }
    }
    Ok(())
}
