//! Configuration for a game session.

use std::time::Duration;

use aw_narrative::FilterConfig;

/// Persisted snapshot key.
pub const DEFAULT_SAVE_KEY: &str = "ttrpg-save";

/// Pause before the enemy turn resolves.
pub const DEFAULT_ENEMY_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
    /// Pause before the enemy turn resolves.
    pub enemy_delay: Duration,
    /// Snapshot key.
    pub save_key: String,
    /// Companion dialogue filter.
    pub filter: FilterConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            enemy_delay: DEFAULT_ENEMY_DELAY,
            save_key: DEFAULT_SAVE_KEY.to_string(),
            filter: FilterConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the enemy delay.
    pub fn with_enemy_delay(mut self, delay: Duration) -> Self {
        self.enemy_delay = delay;
        self
    }

    /// Set the snapshot key.
    pub fn with_save_key(mut self, key: impl Into<String>) -> Self {
        self.save_key = key.into();
        self
    }

    /// Set the dialogue filter.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }
}
