//! Variant types shared across Vigil crates

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind tag reported by the build host for a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKindTag {
    /// Application module variant
    Application,
    /// Library module variant
    Library,
    /// Dynamic feature module variant
    DynamicFeature,
    /// Test variant (unit or instrumented)
    Test,
    /// Anything the host reports that we don't know about
    #[serde(other)]
    Other,
}

impl fmt::Display for VariantKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Application => "application",
            Self::Library => "library",
            Self::DynamicFeature => "dynamic-feature",
            Self::Test => "test",
            Self::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Classification of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    /// Production code variant
    Main,
    /// Test code variant
    Test,
    /// Not handled by orchestration
    Unclassified,
}

impl VariantKind {
    /// Aggregate scope for this kind, if it has one
    pub fn scope(self) -> Option<Scope> {
        match self {
            Self::Main => Some(Scope::Main),
            Self::Test => Some(Scope::Test),
            Self::Unclassified => None,
        }
    }
}

/// Aggregate grouping: production or test code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Production code
    Main,
    /// Test code
    Test,
}

impl Scope {
    /// Suffix used for aggregate task names
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Test => "Test",
        }
    }

    /// Human-readable noun used in descriptions
    pub fn noun(self) -> &'static str {
        match self {
            Self::Main => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Source roots reported for a variant, per language.
///
/// Either list may be absent when the host has no sources of that language
/// registered for the variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantSources {
    /// Primary language roots (Java)
    pub java: Option<Vec<PathBuf>>,
    /// Secondary language roots (Kotlin)
    pub kotlin: Option<Vec<PathBuf>>,
}

impl VariantSources {
    /// All roots flattened, primary language first
    pub fn all(&self) -> Vec<PathBuf> {
        self.java
            .iter()
            .flatten()
            .chain(self.kotlin.iter().flatten())
            .cloned()
            .collect()
    }

    /// Whether no roots are declared at all
    pub fn is_empty(&self) -> bool {
        self.java.as_ref().map_or(true, Vec::is_empty)
            && self.kotlin.as_ref().map_or(true, Vec::is_empty)
    }
}

/// A build variant as delivered by the discovery host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    /// Unique variant name (e.g. "freeRelease")
    pub name: String,

    /// Build type (e.g. "debug")
    #[serde(default)]
    pub build_type: Option<String>,

    /// Merged flavor name (e.g. "free")
    #[serde(default)]
    pub flavor_name: Option<String>,

    /// Kind tag
    pub kind: VariantKindTag,

    /// Source roots
    #[serde(default)]
    pub sources: VariantSources,

    /// Compile-time classpath entries
    #[serde(default)]
    pub compile_classpath: Vec<PathBuf>,
}

impl VariantDescriptor {
    /// Create a descriptor with no build type, flavor, sources or classpath
    pub fn new(name: impl Into<String>, kind: VariantKindTag) -> Self {
        Self {
            name: name.into(),
            build_type: None,
            flavor_name: None,
            kind,
            sources: VariantSources::default(),
            compile_classpath: Vec::new(),
        }
    }

    /// Set the build type
    pub fn with_build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = Some(build_type.into());
        self
    }

    /// Set the flavor name
    pub fn with_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.flavor_name = Some(flavor.into());
        self
    }

    /// Set primary language source roots
    pub fn with_java_sources(mut self, roots: Vec<PathBuf>) -> Self {
        self.sources.java = Some(roots);
        self
    }

    /// Set secondary language source roots
    pub fn with_kotlin_sources(mut self, roots: Vec<PathBuf>) -> Self {
        self.sources.kotlin = Some(roots);
        self
    }

    /// Set the compile classpath
    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.compile_classpath = classpath;
        self
    }
}

/// Upper-case the first character of a name ("freeRelease" -> "FreeRelease")
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
