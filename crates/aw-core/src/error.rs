use crate::id::{CompanionId, ItemId, NodeId};

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when operating on the game state.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The current scene has no choice with this id.
    #[error("unknown choice: {0}")]
    UnknownChoice(String),

    /// The scene graph has no node with this id.
    #[error("unknown scene node: {0}")]
    UnknownNode(NodeId),

    /// The target node exists but is not connected to the current node.
    #[error("scene node {to} is not reachable from {from}")]
    NodeNotAdjacent {
        /// The node the party is standing on.
        from: NodeId,
        /// The requested destination.
        to: NodeId,
    },

    /// The inventory has no item with this id.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// An item with the same id is already in the inventory.
    #[error("item already in inventory: {0}")]
    DuplicateItem(ItemId),

    /// No companion with this id is in the party.
    #[error("unknown companion: {0}")]
    UnknownCompanion(CompanionId),

    /// Two choices in one scene share an id.
    #[error("duplicate choice id \"{0}\" in scene")]
    DuplicateChoice(String),

    /// A scene must offer at least one choice.
    #[error("scene \"{0}\" has no choices")]
    EmptyScene(String),

    /// The scene graph is malformed.
    #[error("invalid scene graph: {0}")]
    InvalidGraph(String),

    /// A restored state violates an aggregate invariant.
    #[error("invalid game state: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// Returns true for errors caused by a caller passing an id that does
    /// not exist. These leave the aggregate untouched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownChoice(_)
                | Self::UnknownNode(_)
                | Self::NodeNotAdjacent { .. }
                | Self::UnknownItem(_)
                | Self::UnknownCompanion(_)
        )
    }
}
