use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of an inventory item, unique within one inventory.
    ItemId
);

string_id!(
    /// Identifier of a node in the scene graph.
    NodeId
);

string_id!(
    /// Identifier of a companion in the party.
    CompanionId
);

impl ItemId {
    /// Generate a fresh random item id (used for loot).
    pub fn generate() -> Self {
        Self(format!("loot_{}", &Uuid::new_v4().simple().to_string()[..12]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_item_ids_differ() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("loot_"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = NodeId::new("corridor");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"corridor\"");
        assert_eq!(id.to_string(), "corridor");
    }
}
