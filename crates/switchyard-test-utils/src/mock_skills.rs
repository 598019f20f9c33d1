// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-driven skill registry.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use switchyard_core::{Skill, SkillMatch, SkillRegistry, SwitchyardError};

/// Skills matched by keyword instead of embeddings.
///
/// The highest-confidence skill whose keyword appears in the text wins.
/// Without embeddings every match attempt fails, as a registry does before
/// its embedding engine is up.
pub struct StaticSkillRegistry {
    skills: Vec<(Skill, String, f64)>,
    embeddings: bool,
}

impl StaticSkillRegistry {
    pub fn new() -> Self {
        Self {
            skills: Vec::new(),
            embeddings: true,
        }
    }

    /// Register skill `id` for the `capability` slot, matched at
    /// `confidence` whenever the text contains `keyword`.
    pub fn with_skill(mut self, id: &str, capability: &str, keyword: &str, confidence: f64) -> Self {
        let skill = Skill {
            id: id.to_string(),
            name: id.replace('-', " "),
            description: format!("Handles {capability} requests about {keyword}"),
            required_capability: capability.to_string(),
            system_prompt: format!("You are an expert in {keyword}."),
        };
        self.skills.push((skill, keyword.to_lowercase(), confidence));
        self
    }

    pub fn without_embeddings(mut self) -> Self {
        self.embeddings = false;
        self
    }
}

impl Default for StaticSkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SkillRegistry for StaticSkillRegistry {
    fn skills(&self) -> Vec<Skill> {
        self.skills.iter().map(|(skill, _, _)| skill.clone()).collect()
    }

    fn has_embeddings(&self) -> bool {
        self.embeddings
    }

    async fn match_skill(
        &self,
        _cancel: &CancellationToken,
        text: &str,
    ) -> Result<Option<SkillMatch>, SwitchyardError> {
        if !self.embeddings {
            return Err(SwitchyardError::collaborator("embedding engine not available"));
        }
        let text = text.to_lowercase();
        Ok(self
            .skills
            .iter()
            .filter(|(_, keyword, _)| text.contains(keyword.as_str()))
            .max_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(skill, _, confidence)| SkillMatch {
                skill: skill.clone(),
                confidence: *confidence,
            }))
    }
}
