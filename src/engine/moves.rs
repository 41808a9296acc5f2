//! Movement. A path is validated in full before anything is committed; on
//! success the destination is authoritative immediately and the motion record
//! plus the busy clock carry the travel time for interpolation.

use crate::engine::{CommandOutcome, ExecutionEngine};
use crate::entities::Motion;
use crate::events::{entities_event, EntitiesOp};
use crate::telemetry::logging;
use crate::world::pathfinding::a_star_pathfinding;
use crate::world::position::{Cell, Direction};
use crate::world::settings::IMPASSABLE;

/// Pull direction abbreviations out of free text; anything else is ignored.
pub fn parse_path(text: &str) -> Vec<Direction> {
    text.split_whitespace()
        .filter_map(Direction::from_abbreviation)
        .collect()
}

impl ExecutionEngine {
    pub(crate) fn execute_move(
        &mut self,
        actor: &str,
        path: &[Direction],
        now: u64,
    ) -> Result<CommandOutcome, String> {
        if path.is_empty() {
            return Err("Path is not traversable".to_string());
        }
        let mut player = self.fetch_player(actor)?;
        let origin = player.cells.clone();
        let instance = player.instance.clone();

        // Walk the whole path against the grid before touching anything.
        // Each step takes a tick, stretched by the biome entered.
        let mut cells = origin.clone();
        let mut duration = 0;
        for &direction in path {
            let next: Vec<Cell> = cells.iter().map(|cell| cell.step(direction)).collect();
            for &cell in &next {
                // Stepping within the current footprint is always legal.
                if cells.contains(&cell) {
                    continue;
                }
                if self.cell_cost(cell, &instance) >= IMPASSABLE {
                    return Err("Path is not traversable".to_string());
                }
            }
            let speed = self.terrain.biome_at(next[0], &instance).traversable_speed();
            let step = if speed > 0.0 {
                (self.config.ms_per_tick as f64 / speed).round() as u64
            } else {
                self.config.ms_per_tick
            };
            duration += step;
            cells = next;
        }
        player.motion = Some(Motion {
            path: path.to_vec(),
            start: origin[0],
            started_at: now,
            duration,
        });
        player.cells = cells.clone();
        player.buclk = now + duration;
        let snapshot = player.clone();
        self.commit_player(player);
        logging::log_game(&format!("{actor} moves {} steps", path.len()));

        // One upsert covering both ends of the walk.
        let mut span = origin;
        span.extend(cells);
        let nearby = self.nearby_player_ids(&span, &instance);
        Ok(CommandOutcome {
            events: vec![entities_event(
                nearby,
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            )],
            triggers: Vec::new(),
        })
    }

    /// Step cost of a cell: biome cost through the traversal cache, bumped to
    /// impassable when a collider item occupies the cell.
    pub(crate) fn cell_cost(&mut self, cell: Cell, instance: &str) -> u32 {
        let collided = self.world.items.values().any(|item| {
            if item.location_instance() != Some(instance) {
                return false;
            }
            let collider = self
                .compendium
                .get(&item.prop)
                .map(|prop| prop.collider)
                .unwrap_or(false);
            collider && item.cells().map(|cells| cells.contains(&cell)).unwrap_or(false)
        });
        if collided {
            return IMPASSABLE;
        }
        let terrain = &self.terrain;
        self.traversal
            .cost(instance, cell, || terrain.biome_at(cell, instance).traversal_cost())
    }

    /// Plan a path from the actor's position. Stops planning once within
    /// `range` of the destination when a range is given.
    pub fn path_to(
        &mut self,
        actor: &str,
        destination: Cell,
        range: Option<i32>,
    ) -> Result<Vec<Direction>, String> {
        let player = self.fetch_player(actor)?;
        let start = player.cells[0];
        let instance = player.instance;
        let items: Vec<(Vec<Cell>, bool)> = self
            .world
            .items
            .values()
            .filter(|item| item.location_instance() == Some(instance.as_str()))
            .filter_map(|item| {
                let collider = self.compendium.get(&item.prop)?.collider;
                Some((item.cells()?.to_vec(), collider))
            })
            .collect();
        let terrain = &self.terrain;
        let traversal = &mut self.traversal;
        let path = a_star_pathfinding(start, destination, range, |cell| {
            let collided = items
                .iter()
                .any(|(cells, collider)| *collider && cells.contains(&cell));
            if collided {
                return IMPASSABLE;
            }
            traversal.cost(&instance, cell, || {
                terrain.biome_at(cell, &instance).traversal_cost()
            })
        });
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{action_command, test_engine};
    use crate::entities::{Item, Player};
    use crate::events::GameEvent;
    use crate::ir::commands::CommandVariables;
    use crate::world::actions::ActionKind;
    use crate::world::settings::LOCATION_INSTANCE;

    fn move_command(path: &str) -> crate::ir::commands::GameCommand {
        let mut command = action_command(ActionKind::Move, None);
        command.variables = Some(CommandVariables {
            query: format!("move {path}"),
            query_irrelevant: path.to_string(),
        });
        command
    }

    #[test]
    fn parse_path_keeps_only_directions() {
        assert_eq!(
            parse_path("s s towards e"),
            vec![Direction::South, Direction::South, Direction::East]
        );
        assert!(parse_path("onwards friends").is_empty());
    }

    #[test]
    fn moving_south_commits_the_destination_at_once() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);

        let outcome = engine
            .execute("player_gandalf", &move_command("s s s s"), 1000)
            .expect("move");

        let moved = engine.world.players.get("player_gandalf").expect("player");
        assert_eq!(moved.cells, vec![Cell::new(4, 0)]);
        let motion = moved.motion.as_ref().expect("motion");
        assert_eq!(motion.path.len(), 4);
        assert_eq!(motion.start, Cell::new(0, 0));
        assert_eq!(motion.started_at, 1000);
        assert_eq!(motion.duration, 4 * engine.config.ms_per_tick);
        assert_eq!(moved.buclk, 1000 + motion.duration);

        // Exactly one upsert announces the move.
        assert_eq!(outcome.events.len(), 1);
        match &outcome.events[0].event {
            GameEvent::Entities { op, players, .. } => {
                assert_eq!(*op, EntitiesOp::Upsert);
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].cells, vec![Cell::new(4, 0)]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn tundra_stretches_the_travel_time() {
        use crate::world::biomes::{Biome, UniformTerrain};

        let mut engine = test_engine();
        engine.terrain = Box::new(UniformTerrain {
            biome: Biome::Tundra,
        });
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);

        engine
            .execute("player_gandalf", &move_command("s s s s"), 1000)
            .expect("move");

        let step = (engine.config.ms_per_tick as f64 / Biome::Tundra.traversable_speed()).round()
            as u64;
        let moved = engine.world.players.get("player_gandalf").expect("player");
        let motion = moved.motion.as_ref().expect("motion");
        assert_eq!(motion.duration, 4 * step);
        assert!(motion.duration > 4 * engine.config.ms_per_tick);
        assert_eq!(moved.buclk, 1000 + motion.duration);
    }

    #[test]
    fn a_collider_blocks_the_whole_walk() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let door = {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            Item::spawn(&prop, Cell::new(2, 0), LOCATION_INSTANCE)
        };
        engine.world.items.insert(door.item.clone(), door);

        let rejection = engine
            .execute("player_gandalf", &move_command("s s s s"), 0)
            .expect_err("blocked");
        assert_eq!(rejection.message, "Path is not traversable");

        // Nothing moved, nothing was saved.
        let player = engine.world.players.get("player_gandalf").expect("player");
        assert_eq!(player.cells, vec![Cell::new(0, 0)]);
        assert!(player.motion.is_none());
        assert_eq!(player.buclk, 0);
    }

    #[test]
    fn a_move_writes_through_the_store_once() {
        use crate::persistence::{Entity, EntityStore, MemoryStore};
        use std::cell::RefCell;
        use std::rc::Rc;

        struct SharedStore(Rc<RefCell<MemoryStore>>);
        impl EntityStore for SharedStore {
            fn fetch_entity(&self, id: &str) -> Option<Entity> {
                self.0.borrow().fetch_entity(id)
            }
            fn save_entity(&mut self, entity: Entity) {
                self.0.borrow_mut().save_entity(entity)
            }
        }

        let store = Rc::new(RefCell::new(MemoryStore::new()));
        let mut engine = test_engine();
        engine.store = Box::new(SharedStore(Rc::clone(&store)));
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);

        engine
            .execute("player_gandalf", &move_command("s s s s"), 0)
            .expect("move");
        assert_eq!(store.borrow().save_count("player_gandalf"), 1);
    }

    #[test]
    fn gibberish_is_not_a_path() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let rejection = engine
            .execute("player_gandalf", &move_command("around the tavern"), 0)
            .expect_err("no path");
        assert_eq!(rejection.message, "Path is not traversable");
    }

    #[test]
    fn path_planning_routes_around_colliders() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        for col in 1..=3 {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            let door = Item::spawn(&prop, Cell::new(2, col), LOCATION_INSTANCE);
            engine.world.items.insert(door.item.clone(), door);
        }
        let path = engine
            .path_to("player_gandalf", Cell::new(4, 4), None)
            .expect("path");
        assert_eq!(
            path,
            vec![
                Direction::Southeast,
                Direction::East,
                Direction::East,
                Direction::Southeast,
                Direction::South,
                Direction::South,
            ]
        );
    }
}
