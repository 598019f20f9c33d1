// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic slot matrix: ranks analyzed models per capability slot.
//!
//! A build scores every candidate, ranks them, applies manual overrides and
//! then publishes the finished [`DynamicMatrix`] with a single pointer swap.
//! Readers holding an older `Arc` keep a consistent view; nobody ever sees a
//! partially built matrix.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use switchyard_config::{MatrixConfig, ScoringWeights};
use switchyard_core::DiscoveryRegistry;

use crate::capability::{AnalyzedModel, CapabilityAnalyzer};
use crate::scoring::{self, CapabilitySlot, ScoringContext};

/// Reason attached to every overridden assignment.
pub const MANUAL_OVERRIDE_REASON: &str = "manual override";

const NO_CANDIDATES_REASON: &str = "no suitable models found";
const MAX_FALLBACKS: usize = 3;

/// The chosen model and its fallback chain for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixAssignment {
    /// Empty when no candidate was eligible.
    pub primary: String,
    /// Up to three next-best models, best first, never containing `primary`.
    pub fallbacks: Vec<String>,
    pub score: f64,
    pub reason: String,
}

impl MatrixAssignment {
    fn empty() -> Self {
        Self {
            primary: String::new(),
            fallbacks: Vec::new(),
            score: 0.0,
            reason: NO_CANDIDATES_REASON.to_string(),
        }
    }
}

/// Immutable slot assignment snapshot.
///
/// Keys are slot names; every [`CapabilitySlot`] is present, and overrides
/// for other names add extra entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicMatrix {
    pub assignments: BTreeMap<String, MatrixAssignment>,
    /// Ids of every model the matrix was built from, in input order.
    pub models: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl DynamicMatrix {
    pub fn get(&self, slot: CapabilitySlot) -> Option<&MatrixAssignment> {
        self.assignments.get(slot.as_ref())
    }

    /// Look up any assignment, including override-only slots.
    pub fn get_named(&self, slot: &str) -> Option<&MatrixAssignment> {
        self.assignments.get(slot)
    }

    pub fn contains_model(&self, id: &str) -> bool {
        self.models.iter().any(|m| m == id)
    }
}

#[derive(Debug, Clone)]
struct BuilderSettings {
    prefer_local: bool,
    cost_optimization: bool,
    overrides: BTreeMap<String, String>,
    weights: ScoringWeights,
}

/// Builds and publishes [`DynamicMatrix`] snapshots.
///
/// Setters only change the settings used by the next [`build`](Self::build);
/// the published matrix is never modified.
#[derive(Debug)]
pub struct MatrixBuilder {
    settings: RwLock<BuilderSettings>,
    current: ArcSwapOption<DynamicMatrix>,
}

impl MatrixBuilder {
    pub fn new(config: &MatrixConfig) -> Self {
        Self {
            settings: RwLock::new(BuilderSettings {
                prefer_local: config.prefer_local,
                cost_optimization: config.cost_optimization,
                overrides: config.overrides.clone(),
                weights: config.weights.clone(),
            }),
            current: ArcSwapOption::empty(),
        }
    }

    /// Score, rank and publish a new matrix for `models`.
    pub fn build(&self, models: &[AnalyzedModel]) -> Arc<DynamicMatrix> {
        let settings = self.settings_snapshot();
        let ctx = ScoringContext {
            weights: &settings.weights,
            prefer_local: settings.prefer_local,
        };

        let mut assignments = BTreeMap::new();
        for slot in CapabilitySlot::ALL {
            let assignment = assign_slot(slot, models, &ctx, settings.cost_optimization);
            assignments.insert(slot.to_string(), assignment);
        }
        apply_overrides(&mut assignments, &settings.overrides);

        let matrix = Arc::new(DynamicMatrix {
            assignments,
            models: models.iter().map(|m| m.model.id.clone()).collect(),
            generated_at: Utc::now(),
        });
        self.current.store(Some(Arc::clone(&matrix)));

        info!(
            models = models.len(),
            overrides = settings.overrides.len(),
            cost_optimization = settings.cost_optimization,
            "published dynamic matrix"
        );
        matrix
    }

    /// Analyze every model the registry currently knows and build from them.
    pub fn rebuild_from(
        &self,
        registry: &dyn DiscoveryRegistry,
        analyzer: &CapabilityAnalyzer,
    ) -> Arc<DynamicMatrix> {
        let analyzed = analyzer.analyze_models(&registry.models());
        self.build(&analyzed)
    }

    /// The most recently published matrix, if any build has run.
    pub fn current_matrix(&self) -> Option<Arc<DynamicMatrix>> {
        self.current.load_full()
    }

    pub fn set_overrides(&self, overrides: BTreeMap<String, String>) {
        self.update(|s| s.overrides = overrides);
    }

    pub fn set_prefer_local(&self, prefer_local: bool) {
        self.update(|s| s.prefer_local = prefer_local);
    }

    pub fn set_cost_optimization(&self, enabled: bool) {
        self.update(|s| s.cost_optimization = enabled);
    }

    fn settings_snapshot(&self) -> BuilderSettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut BuilderSettings)) {
        let mut settings = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut settings);
    }
}

fn assign_slot(
    slot: CapabilitySlot,
    models: &[AnalyzedModel],
    ctx: &ScoringContext<'_>,
    cost_optimization: bool,
) -> MatrixAssignment {
    let mut ranked: Vec<(&AnalyzedModel, f64)> = models
        .iter()
        .map(|m| {
            let mut s = scoring::score(slot, &m.capability, ctx);
            if cost_optimization {
                s *= scoring::cost_multiplier(ctx.weights, m.capability.cost);
            }
            (m, s)
        })
        .filter(|(_, s)| *s > 0.0)
        .collect();

    // Stable: equal scores keep input order.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let Some(((top, top_score), rest)) = ranked.split_first() else {
        return MatrixAssignment::empty();
    };

    let primary = top.model.id.clone();
    let mut fallbacks: Vec<String> = Vec::with_capacity(MAX_FALLBACKS);
    for (candidate, _) in rest {
        if fallbacks.len() == MAX_FALLBACKS {
            break;
        }
        let id = &candidate.model.id;
        if *id != primary && !fallbacks.contains(id) {
            fallbacks.push(id.clone());
        }
    }

    MatrixAssignment {
        primary,
        fallbacks,
        score: *top_score,
        reason: scoring::reason(slot, &top.capability).to_string(),
    }
}

fn apply_overrides(
    assignments: &mut BTreeMap<String, MatrixAssignment>,
    overrides: &BTreeMap<String, String>,
) {
    for (slot, model) in overrides {
        match assignments.get_mut(slot) {
            Some(assignment) => {
                let prior = std::mem::replace(&mut assignment.primary, model.clone());
                assignment.fallbacks.retain(|f| f != model);
                if !prior.is_empty() && prior != *model {
                    assignment.fallbacks.insert(0, prior);
                }
                assignment.fallbacks.truncate(MAX_FALLBACKS);
                assignment.reason = MANUAL_OVERRIDE_REASON.to_string();
            }
            None => {
                assignments.insert(
                    slot.clone(),
                    MatrixAssignment {
                        primary: model.clone(),
                        fallbacks: Vec::new(),
                        score: 1.0,
                        reason: MANUAL_OVERRIDE_REASON.to_string(),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CostTier, LatencyTier, ModelCapability};
    use switchyard_core::DiscoveredModel;

    fn model(id: &str, capability: ModelCapability) -> AnalyzedModel {
        AnalyzedModel {
            model: DiscoveredModel::new(id, "test"),
            capability,
        }
    }

    fn coder(id: &str, context_window: u32) -> AnalyzedModel {
        model(
            id,
            ModelCapability {
                supports_coding: true,
                context_window,
                ..ModelCapability::default()
            },
        )
    }

    #[test]
    fn empty_input_fills_every_slot() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let matrix = builder.build(&[]);
        for slot in CapabilitySlot::ALL {
            let a = matrix.get(slot).unwrap();
            assert!(a.primary.is_empty());
            assert!(a.fallbacks.is_empty());
            assert_eq!(a.reason, "no suitable models found");
        }
    }

    #[test]
    fn current_matrix_is_none_before_build() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        assert!(builder.current_matrix().is_none());
        let built = builder.build(&[coder("a", 32_000)]);
        let current = builder.current_matrix().unwrap();
        assert!(Arc::ptr_eq(&built, &current));
    }

    #[test]
    fn ranks_and_limits_fallbacks() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let models = vec![
            coder("c1", 8_000),
            coder("c2", 200_000),
            coder("c3", 32_000),
            coder("c4", 128_000),
            coder("c5", 16_000),
        ];
        let matrix = builder.build(&models);
        let coding = matrix.get(CapabilitySlot::Coding).unwrap();
        assert_eq!(coding.primary, "c2");
        assert_eq!(coding.fallbacks, vec!["c4", "c3", "c5"]);
        assert_eq!(coding.reason, "coding-optimized model");
    }

    #[test]
    fn ties_keep_input_order() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let matrix = builder.build(&[coder("first", 32_000), coder("second", 32_000)]);
        let coding = matrix.get(CapabilitySlot::Coding).unwrap();
        assert_eq!(coding.primary, "first");
        assert_eq!(coding.fallbacks, vec!["second"]);
    }

    #[test]
    fn vision_slot_excludes_blind_models() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let matrix = builder.build(&[coder("blind", 200_000)]);
        let vision = matrix.get(CapabilitySlot::Vision).unwrap();
        assert!(vision.primary.is_empty());
        assert_eq!(vision.reason, "no suitable models found");
    }

    #[test]
    fn cost_optimization_scales_scores() {
        let cheap_local = model(
            "local",
            ModelCapability {
                latency: LatencyTier::Standard,
                cost: CostTier::Free,
                context_window: 32_000,
                is_local: true,
                ..ModelCapability::default()
            },
        );
        let pricey = model(
            "cloud",
            ModelCapability {
                latency: LatencyTier::Standard,
                cost: CostTier::High,
                context_window: 128_000,
                ..ModelCapability::default()
            },
        );
        let models = vec![pricey, cheap_local];

        let builder = MatrixBuilder::new(&MatrixConfig::default());
        // creative: cloud 0.256 + 0.4 + 0.2 = 0.856; local 0.064 + 0.15 + 0.2 = 0.414
        assert_eq!(
            builder.build(&models).get(CapabilitySlot::Creative).unwrap().primary,
            "cloud"
        );
        // fast: cloud 0.3 + 0.05 = 0.35; local 0.3 + 0.3 + 0.1 = 0.7
        builder.set_cost_optimization(true);
        let matrix = builder.build(&models);
        let fast = matrix.get(CapabilitySlot::Fast).unwrap();
        assert_eq!(fast.primary, "local");
        assert!((fast.score - 0.84).abs() < 1e-9);
    }

    #[test]
    fn override_replaces_primary_and_keeps_prior_as_fallback() {
        let mut config = MatrixConfig::default();
        config
            .overrides
            .insert("coding".to_string(), "pinned".to_string());
        let builder = MatrixBuilder::new(&config);
        let matrix = builder.build(&[
            coder("c1", 200_000),
            coder("c2", 128_000),
            coder("c3", 64_000),
            coder("c4", 32_000),
        ]);
        let coding = matrix.get(CapabilitySlot::Coding).unwrap();
        assert_eq!(coding.primary, "pinned");
        assert_eq!(coding.reason, MANUAL_OVERRIDE_REASON);
        assert_eq!(coding.fallbacks, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn override_of_existing_fallback_is_not_duplicated() {
        let mut overrides = BTreeMap::new();
        overrides.insert("coding".to_string(), "c2".to_string());
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        builder.set_overrides(overrides);
        let matrix = builder.build(&[coder("c1", 200_000), coder("c2", 128_000)]);
        let coding = matrix.get(CapabilitySlot::Coding).unwrap();
        assert_eq!(coding.primary, "c2");
        assert_eq!(coding.fallbacks, vec!["c1"]);
    }

    #[test]
    fn override_for_unknown_slot_creates_assignment() {
        let mut overrides = BTreeMap::new();
        overrides.insert("summarize".to_string(), "llama3.2:3b".to_string());
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        builder.set_overrides(overrides);
        let matrix = builder.build(&[]);
        let a = matrix.get_named("summarize").unwrap();
        assert_eq!(a.primary, "llama3.2:3b");
        assert_eq!(a.score, 1.0);
        assert!(a.fallbacks.is_empty());
        assert_eq!(a.reason, MANUAL_OVERRIDE_REASON);
    }

    #[test]
    fn setters_apply_on_next_build_only() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let before = builder.build(&[coder("c1", 32_000)]);
        let mut overrides = BTreeMap::new();
        overrides.insert("coding".to_string(), "pinned".to_string());
        builder.set_overrides(overrides);
        assert_eq!(
            builder
                .current_matrix()
                .unwrap()
                .get(CapabilitySlot::Coding)
                .unwrap()
                .primary,
            "c1"
        );
        assert_eq!(before.get(CapabilitySlot::Coding).unwrap().primary, "c1");
        let after = builder.build(&[coder("c1", 32_000)]);
        assert_eq!(after.get(CapabilitySlot::Coding).unwrap().primary, "pinned");
    }

    #[test]
    fn rebuild_from_registry() {
        struct Static(Vec<DiscoveredModel>);
        impl DiscoveryRegistry for Static {
            fn models(&self) -> Vec<DiscoveredModel> {
                self.0.clone()
            }
        }

        let registry = Static(vec![
            DiscoveredModel::new("llava:13b", "ollama"),
            DiscoveredModel::new("deepseek-coder:33b", "ollama"),
        ]);
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let matrix = builder.rebuild_from(&registry, &CapabilityAnalyzer::new());
        assert_eq!(matrix.get(CapabilitySlot::Vision).unwrap().primary, "llava:13b");
        assert_eq!(
            matrix.get(CapabilitySlot::Coding).unwrap().primary,
            "deepseek-coder:33b"
        );
        assert!(matrix.contains_model("llava:13b"));
    }

    #[test]
    fn serializes_for_scripts() {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        let matrix = builder.build(&[coder("c1", 32_000)]);
        let value = serde_json::to_value(&*matrix).unwrap();
        assert_eq!(value["assignments"]["coding"]["primary"], "c1");
        assert!(value["generated_at"].is_string());
    }
}
