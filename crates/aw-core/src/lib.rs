//! Core game state for Abyss Walker.
//!
//! This crate owns the data model of a narrative session: the player
//! character, companions, inventory, the scene graph, the current scene,
//! turn state, and the append-only game log. Everything is gathered in a
//! single [`GameAggregate`] that other crates mutate only through its
//! explicit operations.

/// The game aggregate and its commands.
pub mod aggregate;
/// Player character, attributes, and clamped resource pools.
pub mod character;
/// AI companion profiles and relationship scores.
pub mod companion;
/// Built-in starting content for a fresh session.
pub mod defaults;
/// Error types used throughout the crate.
pub mod error;
/// String identifiers for items, nodes, and companions.
pub mod id;
/// Inventory items and the ordered inventory.
pub mod item;
/// Append-only game log.
pub mod log;
/// The branching scene graph (dungeon map).
pub mod map;
/// Scenes and their selectable choices.
pub mod scene;
/// Turn holder state.
pub mod turn;

pub use aggregate::{ActiveScreen, GameAggregate, ItemUse, PartyMemberStatus};
pub use character::{Attributes, PlayerCharacter, Pool, Position, Stat};
pub use companion::{CompanionProfile, CompanionStats, Relationship};
pub use error::{CoreError, CoreResult};
pub use id::{CompanionId, ItemId, NodeId};
pub use item::{Inventory, InventoryItem, ItemEffect, ItemKind};
pub use log::{GameLog, LogEntry, LogKind};
pub use map::{NodeKind, SceneGraph, SceneNode};
pub use scene::{Choice, ChoiceKind, RequiredCheck, Scene};
pub use turn::{TurnHolder, TurnPhase, TurnState};
