// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchyard integration tests.
//!
//! Provides mock collaborators and a temp-directory extension harness so
//! policy tests run without models, networks or persistent storage.

pub mod harness;
pub mod mock_classifier;
pub mod mock_feedback;
pub mod mock_skills;

pub use harness::{write_extension, TestHarness, TestHarnessBuilder};
pub use mock_classifier::{MockClassifier, StaticIntentMatcher};
pub use mock_feedback::MemoryFeedbackRecorder;
pub use mock_skills::StaticSkillRegistry;
