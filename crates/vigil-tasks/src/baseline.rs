//! Baseline file resolution per variant
//!
//! A project configures at most one global baseline, e.g.
//! `config/baseline.xml`. Each variant may override it with a sibling file
//! carrying the variant name, `config/baseline-freeRelease.xml`. Analysis
//! tasks only ever read files that exist; baseline creation tasks always
//! write to the variant-suffixed path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

/// Filesystem existence check used during configuration
pub trait FileProbe: Send + Sync {
    /// Whether a regular file exists at `path`
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileProbe;

impl FileProbe for LocalFileProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Insert a variant name before the extension: `baseline.xml` -> `baseline-debug.xml`
pub fn variant_suffixed(path: &Path, variant_name: &str) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_string_lossy();
    let file_name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, variant_name, ext.to_string_lossy()),
        None => format!("{}-{}", stem, variant_name),
    };
    Some(path.with_file_name(file_name))
}

/// Resolves the baseline wired into each variant task
#[derive(Clone)]
pub struct BaselineResolver {
    global: Option<PathBuf>,
    probe: Arc<dyn FileProbe>,
}

impl fmt::Debug for BaselineResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaselineResolver")
            .field("global", &self.global)
            .finish_non_exhaustive()
    }
}

impl BaselineResolver {
    /// Create a resolver checking the local filesystem
    pub fn new(global: Option<PathBuf>) -> Self {
        Self::with_probe(global, Arc::new(LocalFileProbe))
    }

    /// Create a resolver with a custom existence probe
    pub fn with_probe(global: Option<PathBuf>, probe: Arc<dyn FileProbe>) -> Self {
        Self { global, probe }
    }

    /// Configured global baseline, if any
    pub fn global(&self) -> Option<&Path> {
        self.global.as_deref()
    }

    /// Most specific existing baseline for an analysis task.
    ///
    /// The variant override wins over the global file; files that don't
    /// exist are never returned.
    pub fn resolve_for_analysis(&self, variant_name: &str) -> Option<PathBuf> {
        let global = self.global.as_deref()?;

        if let Some(variant_file) = variant_suffixed(global, variant_name) {
            if self.probe.exists(&variant_file) {
                debug!(variant = variant_name, path = %variant_file.display(), "using variant baseline");
                return Some(variant_file);
            }
        }

        if self.probe.exists(global) {
            debug!(variant = variant_name, path = %global.display(), "using global baseline");
            return Some(global.to_path_buf());
        }

        debug!(variant = variant_name, "no existing baseline");
        None
    }

    /// Output location for a baseline creation task; need not exist yet
    pub fn resolve_for_baseline_creation(&self, variant_name: &str) -> Option<PathBuf> {
        self.global
            .as_deref()
            .and_then(|global| variant_suffixed(global, variant_name))
    }
}
