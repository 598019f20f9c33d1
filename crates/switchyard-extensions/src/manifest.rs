// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension manifest parsing from TOML.
//!
//! Each extension directory holds an `extension.toml` describing the
//! extension and a `policy.syp` policy chunk. The manifest name must equal
//! the directory's identifier.

use std::path::Path;

use serde::Deserialize;
use switchyard_config::is_valid_extension_id;
use switchyard_core::SwitchyardError;

use crate::host::HookPoint;

pub const MANIFEST_FILE: &str = "extension.toml";
pub const POLICY_FILE: &str = "policy.syp";

/// Top-level structure of an extension.toml file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    extension: ExtensionSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtensionSection {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hooks: Vec<String>,
}

/// Parsed extension metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionManifest {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    /// Hooks the extension implements. Empty means "whatever the policy
    /// exposes".
    pub hooks: Vec<HookPoint>,
}

impl ExtensionManifest {
    /// Whether `hook` should be dispatched to this extension.
    pub fn handles(&self, hook: HookPoint) -> bool {
        self.hooks.is_empty() || self.hooks.contains(&hook)
    }
}

fn manifest_error(message: String) -> SwitchyardError {
    SwitchyardError::Config(format!("invalid extension manifest: {message}"))
}

/// Parses an extension manifest from a TOML string.
pub fn parse_manifest(toml_content: &str) -> Result<ExtensionManifest, SwitchyardError> {
    let file: ManifestFile =
        toml::from_str(toml_content).map_err(|e| manifest_error(e.to_string()))?;
    let section = file.extension;

    if !is_valid_extension_id(&section.name) {
        return Err(manifest_error(format!(
            "name '{}' must be a lowercase slug (letters, digits, '-' or '_')",
            section.name
        )));
    }
    if section.version.trim().is_empty() {
        return Err(manifest_error("version must not be empty".to_string()));
    }

    let hooks = section
        .hooks
        .iter()
        .map(|h| {
            h.parse::<HookPoint>()
                .map_err(|_| manifest_error(format!("unknown hook '{h}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExtensionManifest {
        name: section.name,
        version: section.version,
        description: section.description,
        hooks,
    })
}

/// Loads and parses a manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<ExtensionManifest, SwitchyardError> {
    let content = std::fs::read_to_string(path).map_err(|e| SwitchyardError::Collaborator {
        message: format!("failed to read manifest '{}': {e}", path.display()),
        source: Some(Box::new(e)),
    })?;
    parse_manifest(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_full() {
        let manifest = parse_manifest(
            r#"
[extension]
name = "smart-router"
version = "0.2.0"
description = "Routes by classified intent"
hooks = ["on_request"]
"#,
        )
        .unwrap();
        assert_eq!(manifest.name, "smart-router");
        assert_eq!(manifest.version, "0.2.0");
        assert_eq!(manifest.hooks, vec![HookPoint::OnRequest]);
        assert!(manifest.handles(HookPoint::OnRequest));
        assert!(!manifest.handles(HookPoint::OnResponse));
    }

    #[test]
    fn parse_manifest_minimal_handles_every_hook() {
        let manifest = parse_manifest("[extension]\nname = \"basic\"\nversion = \"1\"\n").unwrap();
        assert!(manifest.description.is_none());
        assert!(manifest.handles(HookPoint::OnResponse));
    }

    #[test]
    fn parse_manifest_rejects_bad_names() {
        let err = parse_manifest("[extension]\nname = \"Bad Name\"\nversion = \"1\"\n").unwrap_err();
        assert!(err.to_string().contains("lowercase slug"));
    }

    #[test]
    fn parse_manifest_rejects_unknown_hooks() {
        let err = parse_manifest(
            "[extension]\nname = \"x\"\nversion = \"1\"\nhooks = [\"on_boot\"]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown hook 'on_boot'"));
    }

    #[test]
    fn parse_manifest_missing_section() {
        assert!(parse_manifest("name = \"x\"").is_err());
    }
}
