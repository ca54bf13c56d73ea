//! The abstract enemy turn.

use aw_core::{GameAggregate, LogKind};
use aw_mechanics::RandomSource;

/// What happens during the enemy phase.
pub trait EnemyTurn: Send {
    /// Act on the game. Runs once per enemy phase, after the delay.
    fn act(&mut self, game: &mut GameAggregate, rng: &mut dyn RandomSource);
}

/// Line logged by [`QuietEnemy`].
pub const QUIET_ENEMY_LINE: &str = "敌人回合：黑暗中暂时没有动静。";

/// Logs one system line and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuietEnemy;

impl EnemyTurn for QuietEnemy {
    fn act(&mut self, game: &mut GameAggregate, _rng: &mut dyn RandomSource) {
        game.append_log(LogKind::System, QUIET_ENEMY_LINE);
    }
}
