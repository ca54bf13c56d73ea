//! Player character, attributes, and clamped resource pools.
//!
//! A [`Pool`] is a numeric resource (HP, MP) that can never leave the range
//! `0..=max`. All changes go through [`Pool::adjust`], so the invariant
//! holds no matter how the pool is mutated, including after loading a
//! snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three check attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    /// Strength.
    Str,
    /// Dexterity.
    Dex,
    /// Intelligence.
    Int,
}

impl Stat {
    /// Parse a stat from its short tag (`str`, `dex`, `int`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "str" => Some(Self::Str),
            "dex" => Some(Self::Dex),
            "int" => Some(Self::Int),
            _ => None,
        }
    }

    /// The in-game name of the check for this stat.
    pub fn label(self) -> &'static str {
        match self {
            Self::Str => "力量",
            Self::Dex => "敏捷",
            Self::Int => "智力",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => write!(f, "str"),
            Self::Dex => write!(f, "dex"),
            Self::Int => write!(f, "int"),
        }
    }
}

/// The `{str, dex, int}` attribute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Strength.
    pub str: i32,
    /// Dexterity.
    pub dex: i32,
    /// Intelligence.
    pub int: i32,
}

impl Attributes {
    /// Create an attribute block.
    pub fn new(str: i32, dex: i32, int: i32) -> Self {
        Self { str, dex, int }
    }

    /// Look up the value of a stat.
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Str => self.str,
            Stat::Dex => self.dex,
            Stat::Int => self.int,
        }
    }
}

/// A resource clamped between 0 and its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PoolRepr")]
pub struct Pool {
    current: i32,
    max: i32,
}

#[derive(Deserialize)]
struct PoolRepr {
    current: i32,
    max: i32,
}

impl From<PoolRepr> for Pool {
    fn from(repr: PoolRepr) -> Self {
        Self::with_current(repr.current, repr.max)
    }
}

impl Pool {
    /// A full pool.
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    /// A pool with an explicit starting value, clamped to `0..=max`.
    pub fn with_current(current: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    /// Current value.
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Maximum value.
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Adjust by a delta, clamping to bounds. Returns the new value.
    pub fn adjust(&mut self, delta: i32) -> i32 {
        self.current = self.current.saturating_add(delta).clamp(0, self.max);
        self.current
    }

    /// Returns true if the pool is drained.
    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Returns true if the pool is at its maximum.
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

/// A cell on the tactical grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The human-controlled character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCharacter {
    /// Display name.
    pub name: String,
    /// Hit points.
    pub hp: Pool,
    /// Mana points.
    pub mp: Pool,
    /// Character level.
    pub level: u32,
    /// Experience points.
    pub exp: u32,
    /// Check attributes.
    pub stats: Attributes,
    /// Token position on the tactical grid.
    #[serde(default)]
    pub position: Position,
}

impl PlayerCharacter {
    /// Create a level 1 character with full pools.
    pub fn new(name: impl Into<String>, max_hp: i32, max_mp: i32, stats: Attributes) -> Self {
        Self {
            name: name.into(),
            hp: Pool::new(max_hp),
            mp: Pool::new(max_mp),
            level: 1,
            exp: 0,
            stats,
            position: Position::default(),
        }
    }

    /// Set the grid position.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pool_starts_full() {
        let p = Pool::new(30);
        assert_eq!(p.current(), 30);
        assert!(p.is_full());
        assert!(!p.is_empty());
    }

    #[test]
    fn pool_adjust_clamps() {
        let mut p = Pool::new(30);
        assert_eq!(p.adjust(-45), 0);
        assert!(p.is_empty());
        assert_eq!(p.adjust(12), 12);
        assert_eq!(p.adjust(100), 30);
    }

    #[test]
    fn pool_deserialize_clamps() {
        let p: Pool = serde_json::from_str(r#"{"current": 99, "max": 25}"#).unwrap();
        assert_eq!(p.current(), 25);
        let p: Pool = serde_json::from_str(r#"{"current": -4, "max": 25}"#).unwrap();
        assert_eq!(p.current(), 0);
    }

    #[test]
    fn pool_display() {
        assert_eq!(Pool::with_current(7, 25).to_string(), "7/25");
    }

    #[test]
    fn stat_parse_and_lookup() {
        assert_eq!(Stat::parse("STR"), Some(Stat::Str));
        assert_eq!(Stat::parse("wis"), None);
        let attrs = Attributes::new(16, 12, 10);
        assert_eq!(attrs.get(Stat::Str), 16);
        assert_eq!(attrs.get(Stat::Dex), 12);
        assert_eq!(attrs.get(Stat::Int), 10);
    }

    #[test]
    fn position_display() {
        assert_eq!(Position::new(3, 4).to_string(), "(3,4)");
    }

    proptest! {
        #[test]
        fn pool_stays_in_bounds(max in 0i32..500, deltas in prop::collection::vec(-1000i32..1000, 0..20)) {
            let mut p = Pool::new(max);
            for d in deltas {
                p.adjust(d);
                prop_assert!(p.current() >= 0);
                prop_assert!(p.current() <= p.max());
            }
        }
    }
}
