// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of compiled extensions.
//!
//! Loading takes the write lock; hook dispatch takes a read lock only long
//! enough to clone the ordered list of `Arc`s, so slow hooks never block a
//! reload.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use switchyard_core::SwitchyardError;
use switchyard_script::{compile, Program};

use crate::manifest::{load_manifest, parse_manifest, ExtensionManifest, MANIFEST_FILE, POLICY_FILE};

/// A compiled extension, immutable once loaded.
#[derive(Debug)]
pub struct LoadedExtension {
    pub manifest: ExtensionManifest,
    pub program: Program,
}

impl LoadedExtension {
    pub fn id(&self) -> &str {
        &self.manifest.name
    }
}

/// Outcome of loading an extension directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    /// `(id, reason)` for every extension that was disabled.
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    extensions: RwLock<Vec<Arc<LoadedExtension>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register one extension from source.
    ///
    /// `id` must equal the manifest name. Re-registering an id replaces the
    /// previous version in place, keeping its position.
    pub fn register(
        &self,
        id: &str,
        manifest_toml: &str,
        policy_source: &str,
    ) -> Result<(), SwitchyardError> {
        let manifest = parse_manifest(manifest_toml).map_err(|e| extension_error(id, e))?;
        self.insert(id, manifest, policy_source)
    }

    /// Load the listed extensions from `dir`, in list order.
    ///
    /// A failing extension is logged and skipped; the others still load.
    pub fn load_dir(&self, dir: &Path, enabled: &[String]) -> LoadReport {
        let mut report = LoadReport::default();
        for id in enabled {
            match self.load_one(dir, id) {
                Ok(()) => report.loaded.push(id.clone()),
                Err(e) => {
                    warn!(extension = %id, error = %e, "extension disabled");
                    report.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            dir = %dir.display(),
            "extensions loaded"
        );
        report
    }

    fn load_one(&self, dir: &Path, id: &str) -> Result<(), SwitchyardError> {
        let ext_dir = dir.join(id);
        let manifest = load_manifest(&ext_dir.join(MANIFEST_FILE)).map_err(|e| extension_error(id, e))?;
        let policy_path = ext_dir.join(POLICY_FILE);
        let source = std::fs::read_to_string(&policy_path).map_err(|e| SwitchyardError::Extension {
            id: id.to_string(),
            message: format!("failed to read '{}': {e}", policy_path.display()),
        })?;
        self.insert(id, manifest, &source)
    }

    fn insert(
        &self,
        id: &str,
        manifest: ExtensionManifest,
        policy_source: &str,
    ) -> Result<(), SwitchyardError> {
        if manifest.name != id {
            return Err(SwitchyardError::Extension {
                id: id.to_string(),
                message: format!("manifest name '{}' does not match identifier", manifest.name),
            });
        }
        let program = compile(id, policy_source).map_err(|e| SwitchyardError::Extension {
            id: id.to_string(),
            message: e.to_string(),
        })?;

        let loaded = Arc::new(LoadedExtension { manifest, program });
        let mut extensions = self.extensions.write().unwrap_or_else(PoisonError::into_inner);
        match extensions.iter_mut().find(|e| e.id() == id) {
            Some(slot) => *slot = loaded,
            None => extensions.push(loaded),
        }
        Ok(())
    }

    /// Remove an extension; returns whether it was present.
    pub fn unregister(&self, id: &str) -> bool {
        let mut extensions = self.extensions.write().unwrap_or_else(PoisonError::into_inner);
        let before = extensions.len();
        extensions.retain(|e| e.id() != id);
        extensions.len() != before
    }

    /// Ordered snapshot for one dispatch.
    pub fn snapshot(&self) -> Vec<Arc<LoadedExtension>> {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.snapshot().iter().map(|e| e.id().to_string()).collect()
    }

    pub fn get(&self, id: &str) -> Option<Arc<LoadedExtension>> {
        self.snapshot().into_iter().find(|e| e.id() == id)
    }

    pub fn len(&self) -> usize {
        self.extensions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn extension_error(id: &str, err: SwitchyardError) -> SwitchyardError {
    SwitchyardError::Extension {
        id: id.to_string(),
        message: err.to_string(),
    }
}
