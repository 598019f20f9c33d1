// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchyard routing engine.

use thiserror::Error;

/// The primary error type used across collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum SwitchyardError {
    /// Configuration errors (invalid values, unusable settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// An injected collaborator (classifier, cache, feedback store) failed.
    #[error("collaborator error: {message}")]
    Collaborator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The feedback recorder is in read-only mode and refused the write.
    #[error("feedback recorder is read-only")]
    ReadOnly,

    /// An extension failed to load or execute.
    #[error("extension {id}: {message}")]
    Extension { id: String, message: String },

    /// A hook name outside the fixed extension points was requested.
    #[error("unknown hook: {0}")]
    UnknownHook(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SwitchyardError {
    /// Shorthand for a collaborator failure without an underlying source.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
            source: None,
        }
    }

    /// True for the distinguished read-only refusal.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}
