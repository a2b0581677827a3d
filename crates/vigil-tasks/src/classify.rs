//! Variant classification

use vigil_core::{VariantDescriptor, VariantKind, VariantKindTag};

/// Classify a variant by its kind tag.
///
/// Names are never inspected: a production variant called "qaTest" is
/// still production code.
pub fn classify(variant: &VariantDescriptor) -> VariantKind {
    match variant.kind {
        VariantKindTag::Application | VariantKindTag::Library | VariantKindTag::DynamicFeature => {
            VariantKind::Main
        }
        VariantKindTag::Test => VariantKind::Test,
        VariantKindTag::Other => VariantKind::Unclassified,
    }
}
