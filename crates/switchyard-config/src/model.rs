// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Switchyard.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! keys at parse time, so typos surface as diagnostics instead of silently
//! falling back to defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Switchyard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Default tracing level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dynamic matrix scoring and overrides.
    #[serde(default)]
    pub matrix: MatrixConfig,

    /// Tier escalation settings.
    #[serde(default)]
    pub cascade: CascadeConfig,

    /// Quality signal detector limits.
    #[serde(default)]
    pub quality: QualityConfig,

    /// Extension script host settings.
    #[serde(default)]
    pub extensions: ExtensionsConfig,
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            matrix: MatrixConfig::default(),
            cascade: CascadeConfig::default(),
            quality: QualityConfig::default(),
            extensions: ExtensionsConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dynamic matrix configuration.
///
/// Setters on the matrix builder can change `prefer_local`,
/// `cost_optimization`, and `overrides` at runtime; changes apply on the
/// next build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixConfig {
    /// Boost local models in the secure slot.
    #[serde(default)]
    pub prefer_local: bool,

    /// Multiply raw scores by the cost multipliers.
    #[serde(default)]
    pub cost_optimization: bool,

    /// Slot name to model id. Unknown slot names create new assignments.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,

    /// Scoring weights for every slot.
    #[serde(default)]
    pub weights: ScoringWeights,
}

/// Per-latency-tier weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencyWeights {
    #[serde(default)]
    pub fast: f64,
    #[serde(default)]
    pub standard: f64,
    #[serde(default)]
    pub slow: f64,
}

/// Per-cost-tier weights (also used for the cost-optimization multipliers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostWeights {
    #[serde(default)]
    pub free: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub medium: f64,
    #[serde(default)]
    pub high: f64,
}

/// Weights for one slot's linear scoring formula.
///
/// `capability` is added when the slot's capability flag is set (for the
/// vision slot it is the base score of an eligible model). `context` scales
/// the normalized context window; `locality` is added for local models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotWeights {
    #[serde(default)]
    pub capability: f64,
    #[serde(default)]
    pub context: f64,
    #[serde(default)]
    pub latency: LatencyWeights,
    #[serde(default)]
    pub cost: CostWeights,
    #[serde(default)]
    pub locality: f64,
}

/// The secure slot scores local and remote models on different curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecureWeights {
    #[serde(default = "default_secure_local_base")]
    pub local_base: f64,
    #[serde(default = "default_secure_prefer_local_bonus")]
    pub prefer_local_bonus: f64,
    #[serde(default = "default_secure_local_context")]
    pub local_context: f64,
    #[serde(default = "default_secure_remote_context")]
    pub remote_context: f64,
}

impl Default for SecureWeights {
    fn default() -> Self {
        Self {
            local_base: default_secure_local_base(),
            prefer_local_bonus: default_secure_prefer_local_bonus(),
            local_context: default_secure_local_context(),
            remote_context: default_secure_remote_context(),
        }
    }
}

fn default_secure_local_base() -> f64 {
    0.7
}

fn default_secure_prefer_local_bonus() -> f64 {
    0.2
}

fn default_secure_local_context() -> f64 {
    0.1
}

fn default_secure_remote_context() -> f64 {
    0.3
}

/// Empirical scoring weights for the dynamic matrix.
///
/// The defaults are tuned by hand; changing them changes routing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringWeights {
    #[serde(default = "default_coding_weights")]
    pub coding: SlotWeights,
    #[serde(default = "default_reasoning_weights")]
    pub reasoning: SlotWeights,
    #[serde(default = "default_creative_weights")]
    pub creative: SlotWeights,
    #[serde(default = "default_fast_weights")]
    pub fast: SlotWeights,
    #[serde(default)]
    pub secure: SecureWeights,
    #[serde(default = "default_vision_weights")]
    pub vision: SlotWeights,
    /// Applied to raw scores when cost optimization is on.
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: CostWeights,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            coding: default_coding_weights(),
            reasoning: default_reasoning_weights(),
            creative: default_creative_weights(),
            fast: default_fast_weights(),
            secure: SecureWeights::default(),
            vision: default_vision_weights(),
            cost_multiplier: default_cost_multiplier(),
        }
    }
}

fn default_coding_weights() -> SlotWeights {
    SlotWeights {
        capability: 0.5,
        context: 0.3,
        latency: LatencyWeights {
            fast: 0.15,
            standard: 0.2,
            slow: 0.1,
        },
        ..SlotWeights::default()
    }
}

fn default_reasoning_weights() -> SlotWeights {
    SlotWeights {
        capability: 0.6,
        context: 0.25,
        latency: LatencyWeights {
            fast: 0.05,
            standard: 0.1,
            slow: 0.15,
        },
        ..SlotWeights::default()
    }
}

fn default_creative_weights() -> SlotWeights {
    SlotWeights {
        context: 0.4,
        latency: LatencyWeights {
            fast: 0.15,
            standard: 0.2,
            slow: 0.1,
        },
        cost: CostWeights {
            free: 0.15,
            low: 0.2,
            medium: 0.3,
            high: 0.4,
        },
        ..SlotWeights::default()
    }
}

fn default_fast_weights() -> SlotWeights {
    SlotWeights {
        latency: LatencyWeights {
            fast: 0.6,
            standard: 0.3,
            slow: 0.1,
        },
        cost: CostWeights {
            free: 0.3,
            low: 0.25,
            medium: 0.15,
            high: 0.05,
        },
        locality: 0.1,
        ..SlotWeights::default()
    }
}

fn default_vision_weights() -> SlotWeights {
    SlotWeights {
        capability: 0.7,
        context: 0.2,
        latency: LatencyWeights {
            fast: 0.1,
            standard: 0.08,
            slow: 0.05,
        },
        ..SlotWeights::default()
    }
}

fn default_cost_multiplier() -> CostWeights {
    CostWeights {
        free: 1.2,
        low: 1.1,
        medium: 1.0,
        high: 0.9,
    }
}

/// Cascade (tier escalation) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CascadeConfig {
    /// When false the manager accepts every response without evaluation.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum overall quality to accept a response.
    /// Non-positive values fall back to 0.70 at manager construction.
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Maximum attempts per request chain.
    /// Zero falls back to 2 at manager construction.
    #[serde(default = "default_max_cascades")]
    pub max_cascades: u32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quality_threshold: default_quality_threshold(),
            max_cascades: default_max_cascades(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_quality_threshold() -> f64 {
    0.70
}

fn default_max_cascades() -> u32 {
    2
}

/// Quality signal detector configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityConfig {
    /// Trimmed responses shorter than this many characters are low quality.
    #[serde(default = "default_min_response_length")]
    pub min_response_length: usize,

    /// Number of repeats of a sentence that counts as excessive repetition.
    #[serde(default = "default_repetition_threshold")]
    pub repetition_threshold: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_response_length: default_min_response_length(),
            repetition_threshold: default_repetition_threshold(),
        }
    }
}

fn default_min_response_length() -> usize {
    50
}

fn default_repetition_threshold() -> usize {
    3
}

/// Extension script host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionsConfig {
    /// When false, `run_hook` returns its input unchanged.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one sub-directory per extension.
    /// Defaults to `$XDG_CONFIG/switchyard/extensions` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Extension ids to load, in hook execution order.
    #[serde(default)]
    pub enabled_extensions: Vec<String>,

    /// Wall-clock deadline for one hook invocation of one extension.
    #[serde(default = "default_hook_timeout_ms")]
    pub hook_timeout_ms: u64,

    /// Idle interpreter instances kept in the pool.
    #[serde(default = "default_max_idle_interpreters")]
    pub max_idle_interpreters: usize,

    /// Entry limit for the script-visible key/value cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            enabled_extensions: Vec::new(),
            hook_timeout_ms: default_hook_timeout_ms(),
            max_idle_interpreters: default_max_idle_interpreters(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl ExtensionsConfig {
    /// Resolve the extension directory, falling back to the XDG location.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::config_dir().map(|d| d.join("switchyard/extensions")))
    }
}

fn default_hook_timeout_ms() -> u64 {
    5000
}

fn default_max_idle_interpreters() -> usize {
    8
}

fn default_cache_capacity() -> usize {
    1000
}
