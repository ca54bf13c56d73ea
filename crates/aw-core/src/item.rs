//! Inventory items and the ordered inventory.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::id::ItemId;

/// Broad category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Something to hit with.
    Weapon,
    /// Something to wear.
    Armor,
    /// Used up when used.
    Consumable,
    /// Opens something.
    Key,
}

impl ItemKind {
    /// Parse a kind from its tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weapon" => Some(Self::Weapon),
            "armor" => Some(Self::Armor),
            "consumable" => Some(Self::Consumable),
            "key" => Some(Self::Key),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Consumable => write!(f, "consumable"),
            Self::Key => write!(f, "key"),
        }
    }
}

/// What happens when a consumable is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount", rename_all = "camelCase")]
pub enum ItemEffect {
    /// Restore hit points.
    Heal(i32),
    /// Restore mana points.
    RestoreMana(i32),
}

/// A single item carried by the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique id within the inventory.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Category.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Flavour text.
    #[serde(default)]
    pub description: String,
    /// Emoji icon.
    #[serde(default)]
    pub icon: String,
    /// Effect applied when a consumable is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ItemEffect>,
}

impl InventoryItem {
    /// Create an item with no description, icon, or effect.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: String::new(),
            icon: String::new(),
            effect: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Set the use effect.
    pub fn with_effect(mut self, effect: ItemEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Returns true if using the item removes it.
    pub fn is_consumable(&self) -> bool {
        self.kind == ItemKind::Consumable
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.icon.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.icon, self.name)
        }
    }
}

/// Items in pickup order. Ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the end. Fails if the id is already taken.
    pub fn add(&mut self, item: InventoryItem) -> CoreResult<()> {
        if self.contains(&item.id) {
            return Err(CoreError::DuplicateItem(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove an item by id.
    pub fn remove(&mut self, id: &ItemId) -> Option<InventoryItem> {
        let pos = self.items.iter().position(|i| &i.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Look up an item by id.
    pub fn get(&self, id: &ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Whether an item with this id is present.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|i| &i.id == id)
    }

    /// Items in order.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first id that appears more than once, if any.
    pub(crate) fn first_duplicate(&self) -> Option<&ItemId> {
        self.items
            .iter()
            .enumerate()
            .find(|(i, item)| self.items[..*i].iter().any(|o| o.id == item.id))
            .map(|(_, item)| &item.id)
    }
}

impl FromIterator<InventoryItem> for Inventory {
    fn from_iter<T: IntoIterator<Item = InventoryItem>>(iter: T) -> Self {
        let mut inv = Inventory::new();
        for item in iter {
            // Later duplicates are dropped.
            let _ = inv.add(item);
        }
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion(id: &str) -> InventoryItem {
        InventoryItem::new(id, "治疗药水", ItemKind::Consumable)
            .with_icon("🧪")
            .with_effect(ItemEffect::Heal(20))
    }

    #[test]
    fn add_and_remove_keeps_order() {
        let mut inv = Inventory::new();
        inv.add(potion("a")).unwrap();
        inv.add(InventoryItem::new("b", "长剑", ItemKind::Weapon)).unwrap();
        inv.add(potion("c")).unwrap();
        assert_eq!(inv.len(), 3);

        let removed = inv.remove(&ItemId::new("b")).unwrap();
        assert_eq!(removed.name, "长剑");
        let ids: Vec<&str> = inv.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut inv = Inventory::new();
        inv.add(potion("a")).unwrap();
        let err = inv.add(potion("a")).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateItem(_)));
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn remove_missing_is_none() {
        let mut inv = Inventory::new();
        assert!(inv.remove(&ItemId::new("ghost")).is_none());
    }

    #[test]
    fn from_iter_drops_duplicates() {
        let inv: Inventory = vec![potion("a"), potion("a"), potion("b")].into_iter().collect();
        assert_eq!(inv.len(), 2);
        assert!(inv.first_duplicate().is_none());
    }

    #[test]
    fn item_serde_shape() {
        let json = serde_json::to_value(potion("p")).unwrap();
        assert_eq!(json["type"], "consumable");
        assert_eq!(json["effect"]["type"], "heal");
        assert_eq!(json["effect"]["amount"], 20);

        let plain = InventoryItem::new("k", "铜钥匙", ItemKind::Key);
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("effect").is_none());
    }

    #[test]
    fn display_includes_icon() {
        assert_eq!(potion("p").to_string(), "🧪 治疗药水");
        assert_eq!(InventoryItem::new("k", "铜钥匙", ItemKind::Key).to_string(), "铜钥匙");
    }
}
