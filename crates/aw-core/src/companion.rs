//! AI companion profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::{Pool, Position};
use crate::id::CompanionId;

/// Relationship score towards the player, always within `-100..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct Relationship(i32);

impl Relationship {
    /// Lowest possible score.
    pub const MIN: i32 = -100;
    /// Highest possible score.
    pub const MAX: i32 = 100;

    /// Create a score, clamped to the valid range.
    pub fn new(value: i32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Current score.
    pub fn value(self) -> i32 {
        self.0
    }

    /// Apply a delta, clamping to the valid range. Returns the new score.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        self.0 = self.0.saturating_add(delta).clamp(Self::MIN, Self::MAX);
        self.0
    }
}

impl From<i32> for Relationship {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<Relationship> for i32 {
    fn from(r: Relationship) -> Self {
        r.0
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// A companion's own combat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionStats {
    /// Hit points.
    pub hp: Pool,
    /// Strength.
    pub str: i32,
    /// Dexterity.
    pub dex: i32,
    /// Intelligence.
    pub int: i32,
}

/// An AI-controlled ally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionProfile {
    /// Unique id within the party.
    pub id: CompanionId,
    /// Display name.
    pub name: String,
    /// Class, e.g. warrior.
    pub class: String,
    /// Personality sketch used in the persona prompt.
    pub personality: String,
    /// How the companion talks.
    pub speech_style: String,
    /// What drives the companion.
    pub motivation: String,
    /// Combat block.
    pub stats: CompanionStats,
    /// Attitude towards the player.
    pub relationship: Relationship,
    /// Token position on the tactical grid.
    #[serde(default)]
    pub position: Position,
}
