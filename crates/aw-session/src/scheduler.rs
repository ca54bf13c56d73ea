//! Turn scheduling: Player, then each ally in order, then the enemy.

use std::time::Duration;

use aw_core::{CoreResult, GameAggregate, TurnPhase};
use tokio::time::Instant;

/// The phase after `phase` in a party of `companions` allies.
pub fn next_phase(phase: TurnPhase, companions: usize) -> TurnPhase {
    match phase {
        TurnPhase::Player if companions > 0 => TurnPhase::Ally(0),
        TurnPhase::Player => TurnPhase::Enemy,
        TurnPhase::Ally(i) if i + 1 < companions => TurnPhase::Ally(i + 1),
        TurnPhase::Ally(_) => TurnPhase::Enemy,
        TurnPhase::Enemy => TurnPhase::Player,
    }
}

/// Drives [`TurnPhase`] transitions on a [`GameAggregate`] and holds the
/// single pending enemy self-advance.
#[derive(Debug, Clone)]
pub struct TurnScheduler {
    enemy_delay: Duration,
    pending_enemy: Option<Instant>,
}

impl TurnScheduler {
    /// A scheduler whose enemy turn resolves `enemy_delay` after it starts.
    pub fn new(enemy_delay: Duration) -> Self {
        Self {
            enemy_delay,
            pending_enemy: None,
        }
    }

    /// Move the game to its next phase. Entering the enemy phase schedules
    /// the self-advance; leaving it clears the slot.
    pub fn advance(&mut self, game: &mut GameAggregate) -> CoreResult<TurnPhase> {
        let from = game.phase();
        let to = next_phase(from, game.companions().len());
        game.set_phase(to)?;
        match to {
            TurnPhase::Enemy => {
                self.schedule_enemy();
            }
            TurnPhase::Player => self.pending_enemy = None,
            TurnPhase::Ally(_) => {}
        }
        tracing::debug!(%from, %to, "turn advanced");
        Ok(to)
    }

    /// Schedule the enemy self-advance. Returns false if one is already
    /// pending.
    pub fn schedule_enemy(&mut self) -> bool {
        if self.pending_enemy.is_some() {
            return false;
        }
        self.pending_enemy = Some(Instant::now() + self.enemy_delay);
        true
    }

    /// When the pending enemy turn is due, scheduling one if necessary.
    pub fn enemy_deadline(&mut self) -> Instant {
        self.schedule_enemy();
        self.pending_enemy.unwrap_or_else(Instant::now)
    }

    /// Whether an enemy self-advance is pending.
    pub fn is_enemy_pending(&self) -> bool {
        self.pending_enemy.is_some()
    }

    /// Drop any pending self-advance.
    pub fn clear(&mut self) {
        self.pending_enemy = None;
    }

    /// The configured enemy delay.
    pub fn enemy_delay(&self) -> Duration {
        self.enemy_delay
    }
}
