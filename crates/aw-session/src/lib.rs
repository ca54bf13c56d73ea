//! Sessions for Abyss Walker.
//!
//! [`GameEngine`] is the command surface a front end talks to. It owns the
//! [`aw_core::GameAggregate`], drives the [`TurnScheduler`], calls the
//! narrative layer, and writes a snapshot through a [`SnapshotStore`]
//! after every change.

pub mod config;
pub mod enemy;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod store;

pub use config::SessionConfig;
pub use enemy::{EnemyTurn, QuietEnemy};
pub use engine::{ChoiceOutcome, CompanionTurn, GameEngine, RolledCheck, SettleOutcome};
pub use error::{SessionError, SessionResult, StoreError, StoreResult};
pub use scheduler::{TurnScheduler, next_phase};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore, decode_snapshot, encode_snapshot};
