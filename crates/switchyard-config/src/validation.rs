// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Collects every violation instead of stopping at the first. Values with a
//! documented fallback (non-positive quality threshold, zero max cascades)
//! are accepted here and defaulted where they are consumed.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{CostWeights, LatencyWeights, ScoringWeights, SlotWeights, SwitchyardConfig};

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &SwitchyardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let threshold = config.cascade.quality_threshold;
    if threshold.is_nan() || threshold > 1.0 {
        errors.push(ConfigError::validation(format!(
            "cascade.quality_threshold must be at most 1.0, got {threshold}"
        )));
    }

    if config.quality.repetition_threshold < 2 {
        errors.push(ConfigError::validation(format!(
            "quality.repetition_threshold must be at least 2, got {}",
            config.quality.repetition_threshold
        )));
    }

    for (slot, model) in &config.matrix.overrides {
        if slot.trim().is_empty() {
            errors.push(ConfigError::validation(
                "matrix.overrides contains an empty slot name",
            ));
        }
        if model.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "matrix.overrides.{slot} must name a model"
            )));
        }
    }

    validate_weights(&config.matrix.weights, &mut errors);

    let mut seen = HashSet::new();
    for id in &config.extensions.enabled_extensions {
        if !is_valid_extension_id(id) {
            errors.push(ConfigError::validation(format!(
                "extensions.enabled_extensions: `{id}` is not a valid extension id \
                 (lowercase letters, digits, '-' and '_', starting with a letter)"
            )));
        }
        if !seen.insert(id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "extensions.enabled_extensions lists `{id}` more than once"
            )));
        }
    }

    if config.extensions.hook_timeout_ms == 0 {
        errors.push(ConfigError::validation(
            "extensions.hook_timeout_ms must be greater than 0",
        ));
    }

    if config.extensions.cache_capacity == 0 {
        errors.push(ConfigError::validation(
            "extensions.cache_capacity must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Extension ids are slugs: lowercase ASCII letters, digits, `-` and `_`,
/// starting with a letter, at most 64 characters.
pub fn is_valid_extension_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    id.len() <= 64
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn validate_weights(weights: &ScoringWeights, errors: &mut Vec<ConfigError>) {
    let slots = [
        ("coding", &weights.coding),
        ("reasoning", &weights.reasoning),
        ("creative", &weights.creative),
        ("fast", &weights.fast),
        ("vision", &weights.vision),
    ];
    for (name, slot) in slots {
        for (field, value) in slot_values(slot) {
            check_weight(&format!("matrix.weights.{name}.{field}"), value, errors);
        }
    }

    let secure = &weights.secure;
    for (field, value) in [
        ("local_base", secure.local_base),
        ("prefer_local_bonus", secure.prefer_local_bonus),
        ("local_context", secure.local_context),
        ("remote_context", secure.remote_context),
    ] {
        check_weight(&format!("matrix.weights.secure.{field}"), value, errors);
    }

    for (field, value) in cost_values(&weights.cost_multiplier) {
        check_weight(
            &format!("matrix.weights.cost_multiplier.{field}"),
            value,
            errors,
        );
    }
}

fn check_weight(key: &str, value: f64, errors: &mut Vec<ConfigError>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(ConfigError::validation(format!(
            "{key} must be a finite non-negative number, got {value}"
        )));
    }
}

fn slot_values(slot: &SlotWeights) -> Vec<(&'static str, f64)> {
    let mut values = vec![
        ("capability", slot.capability),
        ("context", slot.context),
        ("locality", slot.locality),
    ];
    values.extend(latency_values(&slot.latency));
    values.extend(cost_values(&slot.cost));
    values
}

fn latency_values(l: &LatencyWeights) -> [(&'static str, f64); 3] {
    [
        ("latency.fast", l.fast),
        ("latency.standard", l.standard),
        ("latency.slow", l.slow),
    ]
}

fn cost_values(c: &CostWeights) -> [(&'static str, f64); 4] {
    [
        ("free", c.free),
        ("low", c.low),
        ("medium", c.medium),
        ("high", c.high),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SwitchyardConfig::default()).is_ok());
    }

    #[test]
    fn non_positive_threshold_is_accepted() {
        let mut config = SwitchyardConfig::default();
        config.cascade.quality_threshold = 0.0;
        config.cascade.max_cascades = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = SwitchyardConfig::default();
        config.cascade.quality_threshold = 1.5;
        config.extensions.hook_timeout_ms = 0;
        config.extensions.enabled_extensions = vec!["Bad Id".into(), "ok".into(), "ok".into()];
        config.matrix.weights.fast.locality = -1.0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn extension_id_rules() {
        assert!(is_valid_extension_id("cortex-router"));
        assert!(is_valid_extension_id("policy_2"));
        assert!(!is_valid_extension_id(""));
        assert!(!is_valid_extension_id("-leading"));
        assert!(!is_valid_extension_id("9lives"));
        assert!(!is_valid_extension_id("Upper"));
        assert!(!is_valid_extension_id("../escape"));
        assert!(!is_valid_extension_id(&"a".repeat(65)));
    }
}
