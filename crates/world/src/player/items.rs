use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::terrain::TerrainKind;

/// Broad item category. Singleton categories allow one equipped item at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Armor,
    Weapon,
    Potion,
    Other,
}

impl ItemType {
    pub const fn is_singleton(self) -> bool {
        matches!(self, Self::Armor | Self::Weapon)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    Armor { defense: u32 },
    Weapon { offense: u32 },
    /// Restores `amount` health, or full health when `amount` is absent.
    HealingPotion {
        #[serde(default)]
        amount: Option<u32>,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(default)]
    pub minimum_xp: u32,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub equipped: bool,
    /// Terrain whose damage this item cancels while equipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub immune_to: Vec<TerrainKind>,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            minimum_xp: 0,
            price: 0,
            equipped: false,
            immune_to: Vec::new(),
        }
    }

    pub fn healing_potion(amount: Option<u32>) -> Self {
        Self::new("Healing potion", ItemKind::HealingPotion { amount })
    }

    pub fn with_minimum_xp(mut self, minimum_xp: u32) -> Self {
        self.minimum_xp = minimum_xp;
        self
    }

    pub fn with_price(mut self, price: u32) -> Self {
        self.price = price;
        self
    }

    pub fn with_immunity(mut self, terrain: TerrainKind) -> Self {
        self.immune_to.push(terrain);
        self
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Armor { .. } => ItemType::Armor,
            ItemKind::Weapon { .. } => ItemType::Weapon,
            ItemKind::HealingPotion { .. } => ItemType::Potion,
            ItemKind::Other => ItemType::Other,
        }
    }

    pub fn can_equip(&self) -> bool {
        matches!(self.kind, ItemKind::Armor { .. } | ItemKind::Weapon { .. })
    }

    pub fn defense(&self) -> u32 {
        match self.kind {
            ItemKind::Armor { defense } => defense,
            _ => 0,
        }
    }

    pub fn offense(&self) -> u32 {
        match self.kind {
            ItemKind::Weapon { offense } => offense,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("no inventory item at slot {index}")]
    NoSuchItem { index: usize },
    #[error("item '{name}' cannot be equipped")]
    NotEquippable { name: String },
    #[error("item '{name}' requires {required} xp, player has {actual}")]
    InsufficientExperience {
        name: String,
        required: u32,
        actual: u32,
    },
}

/// The player's inventory, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerItems {
    items: Vec<InventoryItem>,
}

impl PlayerItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InventoryItem> {
        self.items.get(index)
    }

    pub fn add(&mut self, item: InventoryItem) {
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Option<InventoryItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Equips the item at `index`. Any other equipped item of the same
    /// singleton type is stashed first. Returns `false` if it was already
    /// equipped.
    pub fn equip(&mut self, index: usize, experience: u32) -> Result<bool, ItemError> {
        let item = self
            .items
            .get(index)
            .ok_or(ItemError::NoSuchItem { index })?;
        if !item.can_equip() {
            return Err(ItemError::NotEquippable {
                name: item.name.clone(),
            });
        }
        if item.minimum_xp > experience {
            return Err(ItemError::InsufficientExperience {
                name: item.name.clone(),
                required: item.minimum_xp,
                actual: experience,
            });
        }
        if item.equipped {
            return Ok(false);
        }

        let item_type = item.item_type();
        if item_type.is_singleton() {
            for other in self
                .items
                .iter_mut()
                .filter(|other| other.item_type() == item_type)
            {
                other.equipped = false;
            }
        }
        if let Some(item) = self.items.get_mut(index) {
            item.equipped = true;
        }
        Ok(true)
    }

    /// Unequips the item at `index` but keeps it. Returns `true` if it was
    /// equipped.
    pub fn stash(&mut self, index: usize) -> Result<bool, ItemError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(ItemError::NoSuchItem { index })?;
        Ok(std::mem::replace(&mut item.equipped, false))
    }

    pub fn equipped(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(|item| item.equipped)
    }

    pub fn defense_total(&self) -> u32 {
        self.equipped().map(InventoryItem::defense).sum()
    }

    pub fn offense_total(&self) -> u32 {
        self.equipped().map(InventoryItem::offense).sum()
    }

    pub fn immune_to(&self, terrain: TerrainKind) -> bool {
        self.equipped().any(|item| item.immune_to.contains(&terrain))
    }
}
