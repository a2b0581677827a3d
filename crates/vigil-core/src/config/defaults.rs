//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "vigil.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "vigil.toml";

/// Alternative configuration file name
pub const ALT_CONFIG_FILE: &str = ".vigil.yaml";

/// Prefix of analysis tasks
pub const DEFAULT_ANALYSIS_PREFIX: &str = "vigil";

/// Prefix of baseline creation tasks
pub const DEFAULT_BASELINE_PREFIX: &str = "vigilBaseline";

/// Group every task is registered under
pub const DEFAULT_TASK_GROUP: &str = "verification";

/// Placeholder substituted with the variant name in description templates
pub const VARIANT_PLACEHOLDER: &str = "{variant}";

/// Description template for per-variant analysis tasks
pub const DEFAULT_ANALYSIS_DESCRIPTION: &str =
    "EXPERIMENTAL: Run analysis for {variant} classes with type resolution";

/// Description template for per-variant baseline creation tasks
pub const DEFAULT_BASELINE_DESCRIPTION: &str =
    "EXPERIMENTAL: Creates baseline for {variant} classes with type resolution";

/// Directory receiving per-variant reports
pub const DEFAULT_REPORTS_DIR: &str = "build/reports/vigil";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ALT_CONFIG_FILE,
        ".vigil.toml",
    ]
}

/// Generate default configuration YAML
pub fn default_config_yaml() -> String {
    let config = Config::default();
    serde_yaml::to_string(&config).unwrap_or_else(|_| DEFAULT_CONFIG_TEMPLATE.to_string())
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Vigil Configuration

# baseline: config/baseline.xml

ignore:
  variants: []
  build_types: []
  flavors: []

tasks:
  analysis_prefix: vigil
  baseline_prefix: vigilBaseline
  group: verification
  analysis_description: "EXPERIMENTAL: Run analysis for {variant} classes with type resolution"
  baseline_description: "EXPERIMENTAL: Creates baseline for {variant} classes with type resolution"
  extra_sources: []

reports:
  dir: build/reports/vigil
  formats: [xml, html, txt, sarif]
"#;
