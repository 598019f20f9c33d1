// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The escalation ladder.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ordered escalation level; `Reasoning` is terminal.
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
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Fast,
    Standard,
    Reasoning,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Fast, Tier::Standard, Tier::Reasoning];

    /// The next tier up, or `None` at the top.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Fast => Some(Tier::Standard),
            Tier::Standard => Some(Tier::Reasoning),
            Tier::Reasoning => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Capability slot a tier dispatches to.
    pub fn capability(self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Standard => "chat",
            Tier::Reasoning => "reasoning",
        }
    }

    /// Tier for a capability or intent name; unknown names start at `Fast`.
    pub fn from_capability(capability: &str) -> Tier {
        match capability {
            "chat" | "creative" | "coding" => Tier::Standard,
            "reasoning" | "research" => Tier::Reasoning,
            _ => Tier::Fast,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_ordered() {
        assert!(Tier::Fast < Tier::Standard);
        assert!(Tier::Standard < Tier::Reasoning);
        assert_eq!(Tier::Fast.next(), Some(Tier::Standard));
        assert!(Tier::Reasoning.is_terminal());
    }

    #[test]
    fn capability_mapping() {
        assert_eq!(Tier::from_capability(Tier::Standard.capability()), Tier::Standard);
        assert_eq!(Tier::from_capability("coding"), Tier::Standard);
        assert_eq!(Tier::from_capability("research"), Tier::Reasoning);
        assert_eq!(Tier::from_capability("vision"), Tier::Fast);
    }

    #[test]
    fn parses_names() {
        assert_eq!("reasoning".parse::<Tier>().unwrap(), Tier::Reasoning);
        assert!("turbo".parse::<Tier>().is_err());
    }
}
