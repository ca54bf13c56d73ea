//! d20 skill checks.
//!
//! Roll a d20 and add the attribute modifier `floor((stat - 10) / 2)`.
//! The check succeeds if the total meets or exceeds the difficulty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

/// Sides on the check die.
pub const CHECK_DIE: i32 = 20;

/// Attribute modifier, rounded toward negative infinity. Defined for every
/// `i32`; the result always fits.
pub fn modifier_for(stat: i32) -> i32 {
    (i64::from(stat) - 10).div_euclid(2) as i32
}

/// The outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The natural d20 roll.
    pub roll: i32,
    /// Attribute modifier.
    pub modifier: i32,
    /// `roll + modifier`.
    pub total: i32,
    /// Target total.
    pub difficulty: i32,
    /// `total >= difficulty`.
    pub success: bool,
}

impl CheckResult {
    /// Build a result from a known roll.
    pub fn from_roll(roll: i32, stat: i32, difficulty: i32) -> Self {
        let modifier = modifier_for(stat);
        let total = roll.saturating_add(modifier);
        Self {
            roll,
            modifier,
            total,
            difficulty,
            success: total >= difficulty,
        }
    }

    /// Short verdict.
    pub fn verdict(&self) -> &'static str {
        if self.success { "成功" } else { "失败" }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "d20({}) {:+} = {} vs DC {}: {}",
            self.roll,
            self.modifier,
            self.total,
            self.difficulty,
            self.verdict()
        )
    }
}

/// Resolves checks against an injected random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckResolver;

impl CheckResolver {
    /// Roll a check for `stat` against `difficulty`.
    pub fn resolve(stat: i32, difficulty: i32, rng: &mut dyn RandomSource) -> CheckResult {
        let roll = rng.gen_range(1, CHECK_DIE);
        CheckResult::from_roll(roll, stat, difficulty)
    }
}
