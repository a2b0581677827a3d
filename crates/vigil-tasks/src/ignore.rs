//! Variant deny-list filtering

use std::fmt;

use vigil_core::{IgnoreConfig, VariantDescriptor};

/// Which deny-list matched a variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    VariantName(String),
    BuildType(String),
    Flavor(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VariantName(name) => write!(f, "variant '{}' is ignored", name),
            Self::BuildType(build_type) => write!(f, "build type '{}' is ignored", build_type),
            Self::Flavor(flavor) => write!(f, "flavor '{}' is ignored", flavor),
        }
    }
}

/// Decides whether a variant is excluded from orchestration.
///
/// Holds its own copy of the deny-lists, so edits to the configuration
/// after construction don't affect decisions.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    config: IgnoreConfig,
}

impl IgnoreFilter {
    pub fn new(config: &IgnoreConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whether the variant is excluded
    pub fn is_ignored(&self, variant: &VariantDescriptor) -> bool {
        self.match_reason(variant).is_some()
    }

    /// First deny-list entry matching the variant, checked by name, then
    /// build type, then flavor
    pub fn match_reason(&self, variant: &VariantDescriptor) -> Option<IgnoreReason> {
        if self.config.variants.contains(&variant.name) {
            return Some(IgnoreReason::VariantName(variant.name.clone()));
        }
        if let Some(build_type) = &variant.build_type {
            if self.config.build_types.contains(build_type) {
                return Some(IgnoreReason::BuildType(build_type.clone()));
            }
        }
        if let Some(flavor) = &variant.flavor_name {
            if self.config.flavors.contains(flavor) {
                return Some(IgnoreReason::Flavor(flavor.clone()));
            }
        }
        None
    }
}
