//! Variant manifest files
//!
//! A manifest lists the variants a build host reported, so that the task
//! graph can be planned outside the host. All formats share one shape:
//!
//! ```yaml
//! variants:
//!   - name: freeRelease
//!     kind: application
//!     build_type: release
//!     flavor_name: free
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ManifestError, Result};
use crate::types::VariantDescriptor;

/// Contents of a variant manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantManifest {
    /// Variants in host delivery order
    #[serde(default)]
    pub variants: Vec<VariantDescriptor>,
}

/// Load a variant manifest, picking the parser by file extension
pub fn load_manifest(path: &Path) -> Result<VariantManifest> {
    if !path.exists() {
        return Err(ManifestError::NotFound(path.to_path_buf()).into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    debug!(path = %path.display(), ?extension, "reading variant manifest");

    let content = std::fs::read_to_string(path).map_err(ManifestError::Io)?;
    let parse_error = |reason: String| ManifestError::ParseError {
        path: path.to_path_buf(),
        reason,
    };

    let manifest: VariantManifest = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
        }
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        _ => return Err(ManifestError::UnsupportedFormat(path.to_path_buf()).into()),
    };

    info!(
        path = %path.display(),
        variants = manifest.variants.len(),
        "variant manifest loaded"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariantKindTag;
    use tempfile::TempDir;

    #[test]
    fn test_load_yaml_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("variants.yaml");
        std::fs::write(
            &path,
            "variants:\n  - name: release\n    kind: application\n  - name: releaseUnitTest\n    kind: test\n",
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.variants.len(), 2);
        assert_eq!(manifest.variants[1].kind, VariantKindTag::Test);
    }

    #[test]
    fn test_load_json_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("variants.json");
        std::fs::write(
            &path,
            r#"{"variants": [{"name": "debug", "kind": "library", "build_type": "debug",
                "compile_classpath": ["libs/a.jar"]}]}"#,
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.variants[0].build_type.as_deref(), Some("debug"));
        assert_eq!(manifest.variants[0].compile_classpath.len(), 1);
    }

    #[test]
    fn test_load_toml_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("variants.toml");
        std::fs::write(
            &path,
            "[[variants]]\nname = \"paidRelease\"\nkind = \"dynamic-feature\"\nflavor_name = \"paid\"\n",
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.variants[0].kind, VariantKindTag::DynamicFeature);
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("variants.txt");
        std::fs::write(&path, "release").unwrap();

        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported manifest format"));
    }

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        assert!(load_manifest(&temp.path().join("nope.yaml")).is_err());
    }
}
