pub mod actor;
pub mod item;

pub use actor::{Monster, Motion, Player, DEAD_HP};
pub use item::{Item, ItemLocation};

use serde::{Deserialize, Serialize};

/// Kind of a world entity, recoverable from its id prefix.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Monster,
    Item,
}

impl EntityKind {
    pub fn id(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Monster => "monster",
            EntityKind::Item => "item",
        }
    }

    pub fn from_entity_id(entity_id: &str) -> Option<EntityKind> {
        if entity_id.starts_with("player_") {
            Some(EntityKind::Player)
        } else if entity_id.starts_with("monster_") {
            Some(EntityKind::Monster)
        } else if entity_id.starts_with("item_") {
            Some(EntityKind::Item)
        } else {
            None
        }
    }
}
