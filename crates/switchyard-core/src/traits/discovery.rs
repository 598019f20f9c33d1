// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model discovery collaborator.

use crate::types::DiscoveredModel;

/// Snapshot access to the models found by the most recent discovery cycle.
pub trait DiscoveryRegistry: Send + Sync {
    fn models(&self) -> Vec<DiscoveredModel>;
}
