// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for matrix invariants over arbitrary model sets.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use switchyard_config::{MatrixConfig, ScoringWeights};
use switchyard_core::DiscoveredModel;
use switchyard_router::{
    score, AnalyzedModel, CapabilityAnalyzer, CapabilitySlot, CostTier, LatencyTier,
    MatrixBuilder, ModelCapability, ScoringContext, MANUAL_OVERRIDE_REASON,
};

fn latency() -> impl Strategy<Value = LatencyTier> {
    prop_oneof![
        Just(LatencyTier::Fast),
        Just(LatencyTier::Standard),
        Just(LatencyTier::Slow)
    ]
}

fn cost() -> impl Strategy<Value = CostTier> {
    prop_oneof![
        Just(CostTier::Free),
        Just(CostTier::Low),
        Just(CostTier::Medium),
        Just(CostTier::High)
    ]
}

fn capability() -> impl Strategy<Value = ModelCapability> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        0u32..400_000,
        latency(),
        cost(),
        any::<bool>(),
    )
        .prop_map(
            |(coding, reasoning, vision, context_window, latency, cost, is_local)| {
                ModelCapability {
                    supports_coding: coding,
                    supports_reasoning: reasoning,
                    supports_vision: vision,
                    context_window,
                    latency,
                    cost,
                    is_local,
                }
            },
        )
}

fn models() -> impl Strategy<Value = Vec<AnalyzedModel>> {
    prop::collection::vec(capability(), 0..12).prop_map(|caps| {
        caps.into_iter()
            .enumerate()
            .map(|(i, capability)| AnalyzedModel {
                model: DiscoveredModel::new(format!("model-{i}"), "test"),
                capability,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn vision_assignments_always_have_vision(models in models(), cost_opt in any::<bool>()) {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        builder.set_cost_optimization(cost_opt);
        let matrix = builder.build(&models);
        let by_id: HashMap<_, _> = models.iter().map(|m| (m.model.id.as_str(), &m.capability)).collect();
        let vision = matrix.get(CapabilitySlot::Vision).unwrap();
        for id in std::iter::once(&vision.primary).chain(vision.fallbacks.iter()) {
            if id.is_empty() {
                continue;
            }
            prop_assert!(by_id[id.as_str()].supports_vision);
        }
    }

    #[test]
    fn fallbacks_are_bounded_distinct_and_ordered(models in models(), prefer_local in any::<bool>()) {
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        builder.set_prefer_local(prefer_local);
        let matrix = builder.build(&models);
        let weights = ScoringWeights::default();
        let ctx = ScoringContext { weights: &weights, prefer_local };
        let by_id: HashMap<_, _> = models.iter().map(|m| (m.model.id.as_str(), &m.capability)).collect();

        for slot in CapabilitySlot::ALL {
            let a = matrix.get(slot).unwrap();
            prop_assert!(a.fallbacks.len() <= 3);
            prop_assert!(!a.fallbacks.contains(&a.primary));
            if a.primary.is_empty() {
                prop_assert!(a.fallbacks.is_empty());
                prop_assert!(!a.reason.is_empty());
                continue;
            }
            let mut previous = score(slot, by_id[a.primary.as_str()], &ctx);
            prop_assert!((previous - a.score).abs() < 1e-12);
            for id in &a.fallbacks {
                let s = score(slot, by_id[id.as_str()], &ctx);
                prop_assert!(s > 0.0);
                // Equal scores are allowed: ties keep input order.
                prop_assert!(s <= previous);
                previous = s;
            }
        }
    }

    #[test]
    fn identical_models_rank_in_input_order(capability in capability(), count in 2usize..8) {
        let models: Vec<AnalyzedModel> = (0..count)
            .map(|i| AnalyzedModel {
                model: DiscoveredModel::new(format!("model-{i}"), "test"),
                capability: capability.clone(),
            })
            .collect();
        let matrix = MatrixBuilder::new(&MatrixConfig::default()).build(&models);
        for slot in CapabilitySlot::ALL {
            let a = matrix.get(slot).unwrap();
            if a.primary.is_empty() {
                continue;
            }
            let ranked: Vec<&str> = std::iter::once(a.primary.as_str())
                .chain(a.fallbacks.iter().map(String::as_str))
                .collect();
            let expected: Vec<String> = (0..ranked.len()).map(|i| format!("model-{i}")).collect();
            prop_assert_eq!(ranked, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn override_always_wins(models in models(), slot_index in 0usize..6, pinned in "[a-z]{3,10}") {
        let slot = CapabilitySlot::ALL[slot_index];
        let mut overrides = BTreeMap::new();
        overrides.insert(slot.to_string(), pinned.clone());
        let builder = MatrixBuilder::new(&MatrixConfig::default());
        builder.set_overrides(overrides);
        let matrix = builder.build(&models);
        let a = matrix.get(slot).unwrap();
        prop_assert_eq!(&a.primary, &pinned);
        prop_assert_eq!(a.reason.as_str(), MANUAL_OVERRIDE_REASON);
        prop_assert!(a.fallbacks.len() <= 3);
        prop_assert!(!a.fallbacks.contains(&pinned));
    }

    #[test]
    fn analysis_ignores_case(id in "[a-zA-Z0-9.:-]{1,24}", provider in "[a-zA-Z]{1,10}") {
        let analyzer = CapabilityAnalyzer::new();
        let lower = analyzer.analyze(Some(&DiscoveredModel::new(id.to_lowercase(), provider.to_lowercase())));
        let upper = analyzer.analyze(Some(&DiscoveredModel::new(id.to_uppercase(), provider.to_uppercase())));
        prop_assert_eq!(lower, upper);
    }
}

#[test]
fn empty_build_reports_no_candidates_everywhere() {
    let builder = MatrixBuilder::new(&MatrixConfig::default());
    let matrix = builder.build(&[]);
    assert_eq!(matrix.assignments.len(), CapabilitySlot::ALL.len());
    for a in matrix.assignments.values() {
        assert!(a.primary.is_empty());
        assert!(a.reason.contains("no suitable models"));
    }
}

#[test]
fn equal_scores_keep_input_order_in_fallbacks() {
    let capability = ModelCapability {
        supports_coding: true,
        supports_reasoning: false,
        supports_vision: false,
        context_window: 32_000,
        latency: LatencyTier::Standard,
        cost: CostTier::Free,
        is_local: true,
    };
    let models: Vec<AnalyzedModel> = ["m-a", "m-b", "m-c", "m-d", "m-e"]
        .into_iter()
        .map(|id| AnalyzedModel {
            model: DiscoveredModel::new(id, "test"),
            capability: capability.clone(),
        })
        .collect();
    let matrix = MatrixBuilder::new(&MatrixConfig::default()).build(&models);
    for slot in [CapabilitySlot::Coding, CapabilitySlot::Fast, CapabilitySlot::Secure] {
        let a = matrix.get(slot).unwrap();
        assert_eq!(a.primary, "m-a", "{slot}");
        assert_eq!(a.fallbacks, vec!["m-b", "m-c", "m-d"], "{slot}");
    }
}
