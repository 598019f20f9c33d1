// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Skill registry collaborator.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SwitchyardError;
use crate::types::{Skill, SkillMatch};

/// Registered skills and embedding-based matching against them.
#[async_trait]
pub trait SkillRegistry: Send + Sync {
    /// Every registered skill, in registration order.
    fn skills(&self) -> Vec<Skill>;

    /// True when skills carry embeddings, so `match_skill` can score them.
    fn has_embeddings(&self) -> bool;

    /// Best skill for `text`. `Ok(None)` when nothing clears the registry's
    /// own threshold.
    async fn match_skill(
        &self,
        cancel: &CancellationToken,
        text: &str,
    ) -> Result<Option<SkillMatch>, SwitchyardError>;
}
