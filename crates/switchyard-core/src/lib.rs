// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchyard routing engine.
//!
//! This crate provides the error type, the records exchanged with external
//! collaborators, and the collaborator traits themselves. Routing, cascade,
//! and extension crates depend on these definitions; concrete collaborators
//! (classifiers, feedback stores, discovery pollers) live outside the core.

pub mod error;
pub mod telemetry;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SwitchyardError;
pub use types::{CacheEntry, DiscoveredModel, FeedbackRecord, IntentMatch, Skill, SkillMatch};

pub use traits::{
    Classifier, DiscoveryRegistry, FeedbackRecorder, IntentMatcher, RoutingCache, SkillRegistry,
};
