//! Vigil Core - shared types for variant analysis orchestration
//!
//! This crate provides the variant data model, configuration loading and
//! validation, variant manifests and the error types used by the other
//! Vigil crates.

pub mod config;
pub mod error;
pub mod manifest;
pub mod types;

pub use config::{Config, IgnoreConfig, ReportFormat, ReportsConfig, TasksConfig};
pub use error::{ConfigError, ManifestError, Result, VigilError};
pub use manifest::{load_manifest, VariantManifest};
pub use types::{
    capitalize, Scope, VariantDescriptor, VariantKind, VariantKindTag, VariantSources,
};
