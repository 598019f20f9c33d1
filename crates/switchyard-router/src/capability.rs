// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic capability inference from model metadata.
//!
//! Matches lowercase identifiers against fixed marker tables. Table order
//! and check order matter: markers overlap as substrings ("mini" is inside
//! "gemini"), so the more specific checks run first.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use switchyard_core::DiscoveredModel;

/// Expected response latency class.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LatencyTier {
    Fast,
    #[default]
    Standard,
    Slow,
}

/// Relative per-token cost class.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CostTier {
    Free,
    Low,
    #[default]
    Medium,
    High,
}

/// Inferred capabilities of one model.
///
/// The default value (no flags, zero context window) is what an absent
/// model analyzes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapability {
    pub supports_coding: bool,
    pub supports_reasoning: bool,
    pub supports_vision: bool,
    pub context_window: u32,
    pub latency: LatencyTier,
    pub cost: CostTier,
    pub is_local: bool,
}

/// A discovered model paired with its analyzed capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedModel {
    pub model: DiscoveredModel,
    pub capability: ModelCapability,
}

const CODING_MARKERS: &[&str] = &[
    "code", "codex", "deepseek", "kimi", "coder", "starcoder", "codellama",
];

const REASONING_MARKERS: &[&str] = &[
    "reasoner", "o1", "o3", "thinking", "pro", "reasoning", "think",
];

const VISION_MARKERS: &[&str] = &[
    "vision", "4o", "gpt-4", "gemini", "claude-3", "claude-4", "llava", "multimodal",
];

const LOCAL_PROVIDERS: &[&str] = &["ollama", "lmstudio", "localai", "llamacpp"];

const FAST_MARKERS: &[&str] = &[
    "mini", "fast", "turbo", "flash", "haiku", "0.5b", "1b", "3b",
];

const SLOW_MARKERS: &[&str] = &[
    "reasoner", "o1", "o3", "thinking", "opus", "70b", "405b",
];

const CHEAP_MARKERS: &[&str] = &["mini", "haiku", "flash", "3.5"];

const EXPENSIVE_MARKERS: &[&str] = &["opus", "o1", "o3", "claude-4"];

/// Explicit window tokens, checked against both id and display name.
const EXPLICIT_WINDOWS: &[(&str, u32)] = &[("128k", 128_000), ("200k", 200_000)];

/// Family defaults checked against the id, in order. "gemini" must precede
/// the "-mini" suffix rule.
const FAMILY_WINDOWS: &[(&[&str], u32)] = &[
    (&["gemini"], 128_000),
    (&["-mini", "-haiku"], 8_000),
    (&["gpt-4", "claude"], 128_000),
];

const DEFAULT_CONTEXT_WINDOW: u32 = 32_000;

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

/// Stateless capability analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityAnalyzer;

impl CapabilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one model. `None` yields [`ModelCapability::default`].
    pub fn analyze(&self, model: Option<&DiscoveredModel>) -> ModelCapability {
        let Some(model) = model else {
            return ModelCapability::default();
        };

        let id = model.id.to_lowercase();
        let name = model.display_name.to_lowercase();
        let provider = model.provider.to_lowercase();
        let either = |markers: &[&str]| contains_any(&id, markers) || contains_any(&name, markers);

        let is_local = contains_any(&provider, LOCAL_PROVIDERS);
        let capability = ModelCapability {
            supports_coding: either(CODING_MARKERS),
            supports_reasoning: either(REASONING_MARKERS),
            supports_vision: either(VISION_MARKERS),
            context_window: context_window(&id, &name),
            latency: if either(FAST_MARKERS) {
                LatencyTier::Fast
            } else if either(SLOW_MARKERS) {
                LatencyTier::Slow
            } else {
                LatencyTier::Standard
            },
            cost: if is_local {
                CostTier::Free
            } else if either(CHEAP_MARKERS) {
                CostTier::Low
            } else if either(EXPENSIVE_MARKERS) {
                CostTier::High
            } else {
                CostTier::Medium
            },
            is_local,
        };

        debug!(
            model = %model.id,
            provider = %model.provider,
            coding = capability.supports_coding,
            reasoning = capability.supports_reasoning,
            vision = capability.supports_vision,
            context_window = capability.context_window,
            latency = %capability.latency,
            cost = %capability.cost,
            "analyzed model capabilities"
        );

        capability
    }

    /// Analyze many models; output index `i` corresponds to input index `i`.
    pub fn analyze_batch(&self, models: &[DiscoveredModel]) -> Vec<ModelCapability> {
        models.iter().map(|m| self.analyze(Some(m))).collect()
    }

    /// Analyze and pair each model with its capabilities.
    pub fn analyze_models(&self, models: &[DiscoveredModel]) -> Vec<AnalyzedModel> {
        models
            .iter()
            .map(|m| AnalyzedModel {
                model: m.clone(),
                capability: self.analyze(Some(m)),
            })
            .collect()
    }
}

fn context_window(id: &str, name: &str) -> u32 {
    for (token, window) in EXPLICIT_WINDOWS {
        if id.contains(token) || name.contains(token) {
            return *window;
        }
    }
    for (markers, window) in FAMILY_WINDOWS {
        if contains_any(id, markers) {
            return *window;
        }
    }
    DEFAULT_CONTEXT_WINDOW
}
