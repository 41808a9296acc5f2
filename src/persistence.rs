//! Persistence collaborator seam. The engine owns the authoritative world
//! snapshot and writes each committed mutation through once; storage
//! backends live outside this crate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{Item, Monster, Player};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Player(Player),
    Monster(Monster),
    Item(Item),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Player(player) => &player.player,
            Entity::Monster(monster) => &monster.monster,
            Entity::Item(item) => &item.item,
        }
    }
}

pub trait EntityStore {
    fn fetch_entity(&self, id: &str) -> Option<Entity>;
    /// Called once per committed mutation of an entity.
    fn save_entity(&mut self, entity: Entity);
}

/// Discards everything; the default when no backend is wired up.
#[derive(Debug, Default)]
pub struct NullStore;

impl EntityStore for NullStore {
    fn fetch_entity(&self, _id: &str) -> Option<Entity> {
        None
    }

    fn save_entity(&mut self, _entity: Entity) {}
}

/// In-memory store that records save order, for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: BTreeMap<String, Entity>,
    pub saves: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn save_count(&self, id: &str) -> usize {
        self.saves.iter().filter(|saved| saved.as_str() == id).count()
    }
}

impl EntityStore for MemoryStore {
    fn fetch_entity(&self, id: &str) -> Option<Entity> {
        self.entities.get(id).cloned()
    }

    fn save_entity(&mut self, entity: Entity) {
        self.saves.push(entity.id().to_string());
        self.entities.insert(entity.id().to_string(), entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::position::Cell;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        store.save_entity(Entity::Player(player.clone()));
        match store.fetch_entity("player_gandalf") {
            Some(Entity::Player(fetched)) => assert_eq!(fetched, player),
            other => panic!("unexpected fetch result: {other:?}"),
        }
        assert_eq!(store.save_count("player_gandalf"), 1);
    }

    #[test]
    fn null_store_fetches_nothing() {
        let store = NullStore;
        assert!(store.fetch_entity("player_gandalf").is_none());
    }
}
