//! Turn holder state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who acts next, as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnHolder {
    /// The human player.
    #[default]
    Player,
    /// One of the companions, see [`TurnState::phase`].
    Ally,
    /// The environment.
    Enemy,
}

/// Who acts next, with the ally index folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Waiting for player input.
    Player,
    /// Companion at this index acts.
    Ally(usize),
    /// Environment acts.
    Enemy,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Ally(i) => write!(f, "ally #{i}"),
            Self::Enemy => write!(f, "enemy"),
        }
    }
}

/// The persisted turn record. `active_ally_index` only means something
/// while the holder is [`TurnHolder::Ally`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    current_turn: TurnHolder,
    active_ally_index: usize,
}

impl TurnState {
    /// Player to act.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder.
    pub fn holder(&self) -> TurnHolder {
        self.current_turn
    }

    /// Current phase.
    pub fn phase(&self) -> TurnPhase {
        match self.current_turn {
            TurnHolder::Player => TurnPhase::Player,
            TurnHolder::Ally => TurnPhase::Ally(self.active_ally_index),
            TurnHolder::Enemy => TurnPhase::Enemy,
        }
    }

    /// Replace the phase.
    pub fn set_phase(&mut self, phase: TurnPhase) {
        (self.current_turn, self.active_ally_index) = match phase {
            TurnPhase::Player => (TurnHolder::Player, 0),
            TurnPhase::Ally(i) => (TurnHolder::Ally, i),
            TurnPhase::Enemy => (TurnHolder::Enemy, 0),
        };
    }

    /// Whether the player may act.
    pub fn is_player(&self) -> bool {
        self.current_turn == TurnHolder::Player
    }
}
