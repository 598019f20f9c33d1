// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability analysis and slot assignment for Switchyard.
//!
//! This crate provides:
//! - [`CapabilityAnalyzer`]: heuristic capability inference from model metadata
//! - [`score`]: one scoring entry point over every [`CapabilitySlot`]
//! - [`MatrixBuilder`]: ranks candidates per slot and publishes immutable
//!   [`DynamicMatrix`] snapshots
//! - [`ConfidenceScorer`] and [`IntentVerifier`]: classification helpers
//!   exposed to policy scripts

pub mod capability;
pub mod confidence;
pub mod matrix;
pub mod scoring;
pub mod verify;

pub use capability::{AnalyzedModel, CapabilityAnalyzer, CostTier, LatencyTier, ModelCapability};
pub use confidence::{ConfidenceError, ConfidenceResult, ConfidenceScorer};
pub use matrix::{DynamicMatrix, MatrixAssignment, MatrixBuilder, MANUAL_OVERRIDE_REASON};
pub use scoring::{score, CapabilitySlot, ScoringContext};
pub use verify::IntentVerifier;
