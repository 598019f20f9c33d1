// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response quality evaluation and tier escalation.
//!
//! - [`QualitySignalDetector`] scans response text for defects
//! - [`CascadeManager`] decides whether a response should be retried at the
//!   next [`Tier`]
//! - [`CascadeTracker`] follows one request chain across attempts
//!
//! Everything here is synchronous and never blocks.

pub mod manager;
pub mod signals;
pub mod tier;
pub mod tracker;

pub use manager::{CascadeDecision, CascadeManager, CascadeMetrics};
pub use signals::{
    calculate_overall_quality, has_critical_signals, QualitySignal, QualitySignalDetector,
    SignalKind,
};
pub use tier::Tier;
pub use tracker::{CascadeResult, CascadeTracker};
