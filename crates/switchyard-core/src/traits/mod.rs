// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the routing core.
//!
//! Async traits use `#[async_trait]` so they can be held as `Arc<dyn _>`
//! and injected into the extension bridge.

pub mod cache;
pub mod classifier;
pub mod discovery;
pub mod feedback;
pub mod skills;

pub use cache::RoutingCache;
pub use classifier::{Classifier, IntentMatcher};
pub use discovery::DiscoveryRegistry;
pub use feedback::FeedbackRecorder;
pub use skills::SkillRegistry;
