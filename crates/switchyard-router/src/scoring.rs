// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-slot scoring functions.
//!
//! Each slot maps to a pure scorer in [`SCORERS`]; [`score`] is the single
//! entry point the matrix builder uses.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use switchyard_config::{CostWeights, LatencyWeights, ScoringWeights, SlotWeights};

use crate::capability::{CostTier, LatencyTier, ModelCapability};

/// Fixed routing categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CapabilitySlot {
    Coding,
    Reasoning,
    Creative,
    Fast,
    Secure,
    Vision,
}

impl CapabilitySlot {
    /// Every slot, in matrix order.
    pub const ALL: [CapabilitySlot; 6] = [
        CapabilitySlot::Coding,
        CapabilitySlot::Reasoning,
        CapabilitySlot::Creative,
        CapabilitySlot::Fast,
        CapabilitySlot::Secure,
        CapabilitySlot::Vision,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Inputs shared by every scorer during one build.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub weights: &'a ScoringWeights,
    pub prefer_local: bool,
}

type ScoreFn = fn(&ScoringContext<'_>, &ModelCapability) -> f64;
type ReasonFn = fn(&ModelCapability) -> &'static str;

struct SlotScorer {
    score: ScoreFn,
    reason: ReasonFn,
}

/// Indexed by `CapabilitySlot as usize`.
const SCORERS: [SlotScorer; 6] = [
    SlotScorer {
        score: |ctx, cap| linear(&ctx.weights.coding, cap.supports_coding, cap),
        reason: |cap| {
            if cap.supports_coding {
                "coding-optimized model"
            } else {
                "general model with good context"
            }
        },
    },
    SlotScorer {
        score: |ctx, cap| linear(&ctx.weights.reasoning, cap.supports_reasoning, cap),
        reason: |cap| {
            if cap.supports_reasoning {
                "reasoning-optimized model"
            } else {
                "high-capability model"
            }
        },
    },
    SlotScorer {
        score: |ctx, cap| linear(&ctx.weights.creative, true, cap),
        reason: |_| "general-purpose model",
    },
    SlotScorer {
        score: |ctx, cap| linear(&ctx.weights.fast, true, cap),
        reason: |cap| {
            if cap.latency == LatencyTier::Fast {
                "low-latency model"
            } else {
                "efficient model"
            }
        },
    },
    SlotScorer {
        score: score_secure,
        reason: |cap| {
            if cap.is_local {
                "local model (data stays on-premise)"
            } else {
                "fallback to cloud model"
            }
        },
    },
    SlotScorer {
        score: |ctx, cap| {
            // Hard gate: models without vision are never eligible.
            if cap.supports_vision {
                linear(&ctx.weights.vision, true, cap)
            } else {
                0.0
            }
        },
        reason: |_| "vision-capable model",
    },
];

/// Raw score of `cap` for `slot`, before any cost-optimization multiplier.
pub fn score(slot: CapabilitySlot, cap: &ModelCapability, ctx: &ScoringContext<'_>) -> f64 {
    (SCORERS[slot.index()].score)(ctx, cap)
}

/// Explanation attached to an assignment whose primary has `cap`.
pub fn reason(slot: CapabilitySlot, cap: &ModelCapability) -> &'static str {
    (SCORERS[slot.index()].reason)(cap)
}

/// Multiplier applied when cost optimization is on.
pub fn cost_multiplier(weights: &ScoringWeights, cost: CostTier) -> f64 {
    cost_weight(&weights.cost_multiplier, cost)
}

/// Context window normalized to [0, 1] against 200k tokens.
pub fn normalized_context(cap: &ModelCapability) -> f64 {
    (f64::from(cap.context_window) / 200_000.0).min(1.0)
}

fn linear(w: &SlotWeights, flag: bool, cap: &ModelCapability) -> f64 {
    let mut total = normalized_context(cap) * w.context
        + latency_weight(&w.latency, cap.latency)
        + cost_weight(&w.cost, cap.cost);
    if flag {
        total += w.capability;
    }
    if cap.is_local {
        total += w.locality;
    }
    total
}

fn score_secure(ctx: &ScoringContext<'_>, cap: &ModelCapability) -> f64 {
    let w = &ctx.weights.secure;
    let context = normalized_context(cap);
    if cap.is_local {
        let bonus = if ctx.prefer_local {
            w.prefer_local_bonus
        } else {
            0.0
        };
        w.local_base + bonus + context * w.local_context
    } else {
        context * w.remote_context
    }
}

fn latency_weight(w: &LatencyWeights, tier: LatencyTier) -> f64 {
    match tier {
        LatencyTier::Fast => w.fast,
        LatencyTier::Standard => w.standard,
        LatencyTier::Slow => w.slow,
    }
}

fn cost_weight(w: &CostWeights, tier: CostTier) -> f64 {
    match tier {
        CostTier::Free => w.free,
        CostTier::Low => w.low,
        CostTier::Medium => w.medium,
        CostTier::High => w.high,
    }
}
