use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::world::compendium::{EquipmentSlot, Prop};
use crate::world::position::Cell;

static NEXT_ITEM_ID: AtomicU32 = AtomicU32::new(1);

pub fn mint_item_id(prop: &str) -> String {
    let n = NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed);
    format!("item_{prop}_{n}")
}

/// Where an item is. The variant tag is the item's location type.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemLocation {
    /// On the grid of a location instance.
    Geohash { cells: Vec<Cell>, instance: String },
    /// Carried, unequipped.
    Inventory { owner: String },
    /// Worn or wielded.
    Equipped { owner: String, slot: EquipmentSlot },
    /// Inside another item.
    Inside { item: String },
}

impl ItemLocation {
    /// Location-type string; equipped items report their slot id.
    pub fn kind(&self) -> &'static str {
        match self {
            ItemLocation::Geohash { .. } => "geohash",
            ItemLocation::Inventory { .. } => "inv",
            ItemLocation::Equipped { slot, .. } => slot.id(),
            ItemLocation::Inside { .. } => "in",
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            ItemLocation::Inventory { owner } | ItemLocation::Equipped { owner, .. } => {
                Some(owner)
            }
            _ => None,
        }
    }

    pub fn is_on_grid(&self) -> bool {
        matches!(self, ItemLocation::Geohash { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item: String,
    pub prop: String,
    pub name: String,
    pub location: ItemLocation,
    pub durability: i64,
    pub charges: i64,
    pub state: String,
    pub variables: BTreeMap<String, String>,
    /// Empty string means public.
    pub owner: String,
    pub config_owner: String,
}

impl Item {
    /// Stamp a new item instance from a prop template.
    pub fn spawn(prop: &Prop, cell: Cell, instance: impl Into<String>) -> Self {
        Item {
            item: mint_item_id(&prop.prop),
            prop: prop.prop.clone(),
            name: prop.name.clone(),
            location: ItemLocation::Geohash {
                cells: vec![cell],
                instance: instance.into(),
            },
            durability: prop.durability,
            charges: prop.charges,
            state: prop.default_state.clone(),
            variables: prop
                .variables
                .iter()
                .map(|v| (v.variable.clone(), v.default.clone()))
                .collect(),
            owner: String::new(),
            config_owner: String::new(),
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.durability <= 0
    }

    pub fn in_inventory_of(&self, entity_id: &str) -> bool {
        matches!(&self.location, ItemLocation::Inventory { owner } if owner == entity_id)
    }

    pub fn equipped_by(&self, entity_id: &str) -> bool {
        matches!(&self.location, ItemLocation::Equipped { owner, .. } if owner == entity_id)
    }

    pub fn carried_by(&self, entity_id: &str) -> bool {
        self.in_inventory_of(entity_id) || self.equipped_by(entity_id)
    }

    /// Grid cells, when on the grid.
    pub fn cells(&self) -> Option<&[Cell]> {
        match &self.location {
            ItemLocation::Geohash { cells, .. } => Some(cells),
            _ => None,
        }
    }

    /// Location instance, when on the grid.
    pub fn location_instance(&self) -> Option<&str> {
        match &self.location {
            ItemLocation::Geohash { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Permission gate for taking and using; empty owner means public.
    pub fn owned_by(&self, entity_id: &str) -> bool {
        self.owner.is_empty() || self.owner == entity_id
    }

    /// Permission gate for configuring.
    pub fn configurable_by(&self, entity_id: &str) -> bool {
        self.config_owner.is_empty() || self.config_owner == entity_id
    }
}
