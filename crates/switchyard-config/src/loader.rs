// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./switchyard.toml` > `~/.config/switchyard/switchyard.toml`
//! > `/etc/switchyard/switchyard.toml` with environment variable overrides via
//! the `SWITCHYARD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SwitchyardConfig;

/// Config sections addressable from environment variables.
const ENV_SECTIONS: &[&str] = &["matrix", "cascade", "quality", "extensions"];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/switchyard/switchyard.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "switchyard.toml";

/// Path of the per-user config file, if the platform has a config dir.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("switchyard/switchyard.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchyard/switchyard.toml` (system-wide)
/// 3. `~/.config/switchyard/switchyard.toml` (user XDG config)
/// 4. `./switchyard.toml` (local directory)
/// 5. `SWITCHYARD_*` environment variables
pub fn load_config() -> Result<SwitchyardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchyardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchyardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchyardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchyardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SwitchyardConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Only the leading section name is turned into a dot, so
/// `SWITCHYARD_CASCADE_QUALITY_THRESHOLD` maps to `cascade.quality_threshold`
/// rather than `cascade.quality.threshold`.
fn env_provider() -> Env {
    Env::prefixed("SWITCHYARD_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section() {
        assert_eq!(
            map_env_key("cascade_quality_threshold"),
            "cascade.quality_threshold"
        );
        assert_eq!(
            map_env_key("quality_min_response_length"),
            "quality.min_response_length"
        );
        assert_eq!(
            map_env_key("extensions_hook_timeout_ms"),
            "extensions.hook_timeout_ms"
        );
        assert_eq!(map_env_key("log_level"), "log_level");
    }

    #[test]
    fn env_override_applies_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                "[cascade]\nquality_threshold = 0.8\nmax_cascades = 4\n",
            )?;
            jail.set_env("SWITCHYARD_CASCADE_QUALITY_THRESHOLD", "0.5");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.cascade.quality_threshold, 0.5);
            assert_eq!(config.cascade.max_cascades, 4);
            Ok(())
        });
    }
}
