//! Command execution. The engine owns the authoritative world snapshot,
//! validates commands against it, commits mutations and returns the typed
//! events each mutation produced. Given the same world, command, clock and
//! seed it always produces the same outcome.

pub mod abilities;
pub mod combat;
pub mod items;
pub mod moves;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::entities::{Item, Monster, Player};
use crate::events::{
    entities_event, feed_error, feed_message_with_variables, AddressedEvent, EntitiesOp, GameEvent,
};
use crate::ir::commands::{CommandVerb, GameCommand, Offer};
use crate::persistence::{Entity, EntityStore, NullStore};
use crate::telemetry::logging;
use crate::world::abilities::{builtin_abilities, Ability};
use crate::world::actions::{builtin_actions, Action, ActionKind};
use crate::world::biomes::{Terrain, TraversalCache, UniformTerrain};
use crate::world::compendium::Compendium;
use crate::world::position::Cell;
use crate::world::settings::{LOCATION_INSTANCE, MS_PER_TURN, RESPAWN_BUSY_TURNS};

pub use combat::GameRng;

/// Authoritative entity snapshot, keyed by entity id.
#[derive(Debug, Default)]
pub struct WorldState {
    pub players: BTreeMap<String, Player>,
    pub monsters: BTreeMap<String, Monster>,
    pub items: BTreeMap<String, Item>,
}

/// Hooks for systems outside the core that watch for progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestTrigger {
    Kill { killer: String, victim: String },
    Give { item: String, from: String, to: String },
    Enter { actor: String, item: String },
}

/// Everything a committed command produced.
#[derive(Debug, Default)]
pub struct CommandOutcome {
    pub events: Vec<AddressedEvent>,
    pub triggers: Vec<QuestTrigger>,
}

impl CommandOutcome {
    fn merge(&mut self, other: CommandOutcome) {
        self.events.extend(other.events);
        self.triggers.extend(other.triggers);
    }
}

/// A rejected command. The message and the feed event carry the identical
/// user-visible text; nothing was mutated.
#[derive(Debug)]
pub struct CommandRejection {
    pub message: String,
    pub feed: AddressedEvent,
}

/// Where and how a dead player comes back.
pub trait Respawn {
    fn respawn(&self, player: &mut Player, now: u64);
}

/// Respawns at a fixed sanctuary cell on the overworld: currencies halved,
/// stats restored, busy for ten turns.
pub struct SanctuaryRespawn {
    pub sanctuary: Cell,
}

impl Default for SanctuaryRespawn {
    fn default() -> Self {
        SanctuaryRespawn {
            sanctuary: Cell::new(0, 0),
        }
    }
}

impl Respawn for SanctuaryRespawn {
    fn respawn(&self, player: &mut Player, now: u64) {
        player.cells = vec![self.sanctuary];
        player.instance = LOCATION_INSTANCE.to_string();
        player.lum /= 2;
        player.umb /= 2;
        let stats = player.max_stats();
        player.hp = stats.hp;
        player.mp = stats.mp;
        player.st = stats.st;
        player.ap = stats.ap;
        player.motion = None;
        player.buclk = now + RESPAWN_BUSY_TURNS * MS_PER_TURN;
    }
}

pub struct ExecutionEngine {
    pub world: WorldState,
    pub config: CoreConfig,
    pub terrain: Box<dyn Terrain>,
    pub store: Box<dyn EntityStore>,
    pub respawn: Box<dyn Respawn>,
    pub compendium: Compendium,
    pub actions: Vec<Action>,
    pub abilities: Vec<Ability>,
    pub(crate) rng: GameRng,
    pub(crate) traversal: TraversalCache,
}

impl ExecutionEngine {
    pub fn new(config: CoreConfig) -> Self {
        let rng = GameRng::new(config.rng_seed);
        let traversal = TraversalCache::new(config.traversal_cache_size.max(1));
        ExecutionEngine {
            world: WorldState::default(),
            config,
            terrain: Box::new(UniformTerrain::default()),
            store: Box::new(NullStore),
            respawn: Box::new(SanctuaryRespawn::default()),
            compendium: Compendium::builtin(),
            actions: builtin_actions(),
            abilities: builtin_abilities(),
            rng,
            traversal,
        }
    }

    /// Execute one command for `actor`. Busy actors are rejected before any
    /// other validation; every rejection leaves the world untouched.
    pub fn execute(
        &mut self,
        actor: &str,
        command: &GameCommand,
        now: u64,
    ) -> Result<CommandOutcome, CommandRejection> {
        let result = self.dispatch(actor, command, now);
        match result {
            Ok(outcome) => Ok(outcome),
            Err(message) => {
                logging::log_error(&format!("{actor}: {message}"));
                Err(CommandRejection {
                    feed: feed_error(actor, message.clone()),
                    message,
                })
            }
        }
    }

    fn dispatch(
        &mut self,
        actor: &str,
        command: &GameCommand,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let player = self
            .world
            .players
            .get(actor)
            .ok_or_else(|| format!("{actor} is not in the world"))?;
        if player.is_busy(now) {
            return Err(format!("{} is busy", player.name));
        }

        match &command.verb {
            CommandVerb::Action(kind) => match kind {
                ActionKind::Look => self.perform_look(actor),
                ActionKind::Inventory => self.perform_inventory(actor),
                ActionKind::Say => {
                    let message = command
                        .variables
                        .as_ref()
                        .map(|v| v.query_irrelevant.clone())
                        .unwrap_or_default();
                    self.perform_say(actor, command.entities.target.as_deref(), &message, now)
                }
                ActionKind::Move => {
                    let path = moves::parse_path(
                        command
                            .variables
                            .as_ref()
                            .map(|v| v.query_irrelevant.as_str())
                            .unwrap_or(""),
                    );
                    self.execute_move(actor, &path, now)
                }
                ActionKind::Rest => self.perform_rest(actor, now),
                ActionKind::Attack => {
                    let target = command
                        .entities
                        .target
                        .as_deref()
                        .ok_or("Target is out of range")?;
                    self.execute_attack(actor, target, now)
                }
                ActionKind::Take => {
                    let item = require_target(command)?;
                    self.take_item(actor, item, now)
                }
                ActionKind::Drop => {
                    let item = require_target(command)?;
                    self.drop_item(actor, item, now)
                }
                ActionKind::Equip => {
                    let item = require_target(command)?;
                    self.equip_item_in_default_slot(actor, item, now)
                }
                ActionKind::Unequip => {
                    let item = require_target(command)?;
                    self.unequip_item(actor, item, now)
                }
                ActionKind::Enter => {
                    let item = require_target(command)?;
                    self.enter_item(actor, item, now)
                }
                ActionKind::Give => {
                    let item = command
                        .entities
                        .item
                        .as_deref()
                        .ok_or("Target is out of range")?;
                    let to = require_target(command)?;
                    self.give_item(actor, item, to, now)
                }
                ActionKind::Configure => {
                    let item = require_target(command)?;
                    let assignments = command
                        .variables
                        .as_ref()
                        .map(|v| v.query_irrelevant.as_str())
                        .unwrap_or("");
                    self.configure_item(actor, item, assignments, now)
                }
                ActionKind::Trade => {
                    let target = require_target(command)?;
                    self.perform_trade(
                        actor,
                        target,
                        command.entities.offer.clone(),
                        command.entities.receive.clone(),
                        now,
                    )
                }
            },
            CommandVerb::Ability(name) => {
                let name = name.clone();
                self.perform_ability(actor, command.entities.target.as_deref(), &name, now, false)
            }
            CommandVerb::Utility { item, utility } => {
                let (item, utility) = (item.clone(), utility.clone());
                self.use_item(actor, &item, &utility, command.entities.target.as_deref(), now)
            }
        }
    }

    /// Player ids within the event broadcast range of `cells`, the actor
    /// included. Computed at commit time, never from subscriptions.
    pub fn nearby_player_ids(&self, cells: &[Cell], instance: &str) -> Vec<String> {
        self.world
            .players
            .values()
            .filter(|player| {
                player.instance == instance
                    && crate::world::position::entity_in_range(
                        cells,
                        &player.cells,
                        self.config.event_range,
                    )
            })
            .map(|player| player.player.clone())
            .collect()
    }

    pub(crate) fn busy_until(&self, now: u64, ticks: u32) -> u64 {
        now + ticks as u64 * self.config.ms_per_tick
    }

    pub(crate) fn action(&self, kind: ActionKind) -> &Action {
        // The builtin registry always carries every kind.
        self.actions
            .iter()
            .find(|action| action.action == kind)
            .unwrap_or(&self.actions[0])
    }

    /// Commit one player mutation: snapshot into the world and write through
    /// the store exactly once.
    pub(crate) fn commit_player(&mut self, player: Player) {
        self.store.save_entity(Entity::Player(player.clone()));
        self.world.players.insert(player.player.clone(), player);
    }

    pub(crate) fn commit_monster(&mut self, monster: Monster) {
        self.store.save_entity(Entity::Monster(monster.clone()));
        self.world.monsters.insert(monster.monster.clone(), monster);
    }

    pub(crate) fn commit_item(&mut self, item: Item) {
        self.store.save_entity(Entity::Item(item.clone()));
        self.world.items.insert(item.item.clone(), item);
    }

    fn perform_look(&mut self, actor: &str) -> Result<CommandOutcome, String> {
        let player = self.fetch_player(actor)?;
        let page = self.config.look_page_size;

        let monsters: Vec<Monster> = self
            .world
            .monsters
            .values()
            .filter(|m| {
                m.instance == player.instance
                    && crate::world::position::entity_in_range(
                        &player.cells,
                        &m.cells,
                        self.config.event_range,
                    )
            })
            .take(page)
            .cloned()
            .collect();
        let players: Vec<Player> = self
            .world
            .players
            .values()
            .filter(|p| {
                p.instance == player.instance
                    && crate::world::position::entity_in_range(
                        &player.cells,
                        &p.cells,
                        self.config.event_range,
                    )
            })
            .take(page)
            .cloned()
            .collect();
        let items: Vec<Item> = self
            .world
            .items
            .values()
            .filter(|item| match item.cells() {
                Some(cells) => {
                    item.location_instance() == Some(player.instance.as_str())
                        && crate::world::position::entity_in_range(
                            &player.cells,
                            cells,
                            self.config.event_range,
                        )
                }
                None => false,
            })
            .take(page)
            .cloned()
            .collect();

        Ok(CommandOutcome {
            events: vec![entities_event(
                vec![actor.to_string()],
                EntitiesOp::Replace,
                players,
                monsters,
                items,
            )],
            triggers: Vec::new(),
        })
    }

    fn perform_inventory(&mut self, actor: &str) -> Result<CommandOutcome, String> {
        let carried: Vec<Item> = self
            .world
            .items
            .values()
            .filter(|item| item.carried_by(actor))
            .cloned()
            .collect();
        Ok(CommandOutcome {
            events: vec![entities_event(
                vec![actor.to_string()],
                EntitiesOp::Replace,
                Vec::new(),
                Vec::new(),
                carried,
            )],
            triggers: Vec::new(),
        })
    }

    fn perform_say(
        &mut self,
        actor: &str,
        target: Option<&str>,
        message: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let ticks = self.action(ActionKind::Say).ticks;
        player.buclk = self.busy_until(now, ticks);
        let name = player.name.clone();
        let cells = player.cells.clone();
        let instance = player.instance.clone();
        self.commit_player(player);

        let to = match target {
            Some(target) => vec![target.to_string()],
            None => self.nearby_player_ids(&cells, &instance),
        };
        let mut variables = BTreeMap::new();
        variables.insert("name".to_string(), name);
        variables.insert("message".to_string(), message.to_string());
        Ok(CommandOutcome {
            events: vec![feed_message_with_variables(
                to,
                "${name} says ${message}",
                variables,
            )],
            triggers: Vec::new(),
        })
    }

    fn perform_rest(&mut self, actor: &str, now: u64) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let ticks = self.action(ActionKind::Rest).ticks;
        player.buclk = self.busy_until(now, ticks);
        let stats = player.max_stats();
        player.hp = stats.hp;
        player.mp = stats.mp;
        player.st = stats.st;
        let snapshot = player.clone();
        self.commit_player(player);

        Ok(CommandOutcome {
            events: vec![entities_event(
                vec![actor.to_string()],
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            )],
            triggers: Vec::new(),
        })
    }

    fn perform_trade(
        &mut self,
        actor: &str,
        target: &str,
        offer: Option<Offer>,
        receive: Option<Offer>,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let counterparty = self
            .world
            .players
            .get(target)
            .ok_or_else(|| format!("{target} is out of range"))?;
        let action = self.action(ActionKind::Trade);
        if !crate::world::position::entity_in_range(
            &player.cells,
            &counterparty.cells,
            action.range,
        ) {
            return Err(format!("{} is out of range", counterparty.name));
        }
        let ticks = action.ticks;
        player.buclk = self.busy_until(now, ticks);
        let name = player.name.clone();
        self.commit_player(player);

        let message = match (&offer, &receive) {
            (Some(_), Some(_)) => format!("{name} proposes a trade"),
            _ => format!("{name} makes an offer"),
        };
        Ok(CommandOutcome {
            events: vec![AddressedEvent {
                to: vec![target.to_string()],
                event: GameEvent::Cta {
                    name: "trade".to_string(),
                    source: actor.to_string(),
                    message,
                    offer,
                },
            }],
            triggers: Vec::new(),
        })
    }

    pub(crate) fn fetch_player(&self, id: &str) -> Result<Player, String> {
        self.world
            .players
            .get(id)
            .cloned()
            .ok_or_else(|| format!("{id} is not in the world"))
    }

    pub(crate) fn fetch_item(&self, id: &str) -> Result<Item, String> {
        self.world
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| format!("{id} is not in the world"))
    }
}

fn require_target<'a>(command: &'a GameCommand) -> Result<&'a str, String> {
    command
        .entities
        .target
        .as_deref()
        .ok_or_else(|| "Target is out of range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::commands::{CommandEntities, CommandVariables};
    use crate::persistence::MemoryStore;

    pub(crate) fn test_engine() -> ExecutionEngine {
        let mut engine = ExecutionEngine::new(CoreConfig::default());
        engine.store = Box::new(MemoryStore::new());
        engine
    }

    pub(crate) fn action_command(kind: ActionKind, target: Option<&str>) -> GameCommand {
        GameCommand {
            verb: CommandVerb::Action(kind),
            entities: CommandEntities {
                self_id: "player_gandalf".into(),
                target: target.map(str::to_string),
                ..CommandEntities::default()
            },
            variables: Some(CommandVariables {
                query: String::new(),
                query_irrelevant: String::new(),
            }),
        }
    }

    #[test]
    fn busy_actor_is_rejected_with_matching_feed() {
        let mut engine = test_engine();
        let mut player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        player.buclk = 10_000;
        engine.world.players.insert(player.player.clone(), player);

        let command = action_command(ActionKind::Look, None);
        let rejection = engine
            .execute("player_gandalf", &command, 0)
            .expect_err("busy");
        assert_eq!(rejection.message, "Gandalf is busy");
        match rejection.feed.event {
            GameEvent::Feed { kind, message, .. } => {
                assert_eq!(kind, crate::events::FeedKind::Error);
                assert_eq!(message, rejection.message);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn look_replaces_entities_for_the_actor_only() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        let far = Player::new("player_saruman", "Saruman", Cell::new(100, 100));
        engine.world.players.insert(player.player.clone(), player);
        engine.world.players.insert(far.player.clone(), far);

        let outcome = engine
            .execute("player_gandalf", &action_command(ActionKind::Look, None), 0)
            .expect("look");
        assert_eq!(outcome.events.len(), 1);
        let event = &outcome.events[0];
        assert_eq!(event.to, vec!["player_gandalf".to_string()]);
        match &event.event {
            GameEvent::Entities { op, players, .. } => {
                assert_eq!(*op, EntitiesOp::Replace);
                assert_eq!(players.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn say_reaches_only_players_in_range() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        let near = Player::new("player_saruman", "Saruman", Cell::new(0, 3));
        let far = Player::new("player_radagast", "Radagast", Cell::new(0, 50));
        for p in [player, near, far] {
            engine.world.players.insert(p.player.clone(), p);
        }

        let mut command = action_command(ActionKind::Say, None);
        command.variables = Some(CommandVariables {
            query: "say hello there".into(),
            query_irrelevant: "hello there".into(),
        });
        let outcome = engine.execute("player_gandalf", &command, 0).expect("say");
        assert_eq!(outcome.events.len(), 1);
        let to = &outcome.events[0].to;
        assert!(to.contains(&"player_gandalf".to_string()));
        assert!(to.contains(&"player_saruman".to_string()));
        assert!(!to.contains(&"player_radagast".to_string()));
        match &outcome.events[0].event {
            GameEvent::Feed { variables, .. } => {
                assert_eq!(variables.get("message").map(String::as_str), Some("hello there"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn rest_restores_stats_and_sets_a_long_busy_clock() {
        let mut engine = test_engine();
        let mut player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        player.hp = 1;
        player.mp = 0;
        engine.world.players.insert(player.player.clone(), player);

        let outcome = engine
            .execute("player_gandalf", &action_command(ActionKind::Rest, None), 1000)
            .expect("rest");
        assert_eq!(outcome.events.len(), 1);
        let rested = engine.world.players.get("player_gandalf").expect("player");
        assert_eq!(rested.hp, rested.max_stats().hp);
        let expected = 1000 + 40 * engine.config.ms_per_tick;
        assert_eq!(rested.buclk, expected);
    }

    #[test]
    fn respawn_halves_currencies_and_moves_to_sanctuary() {
        let mut player = Player::new("player_gandalf", "Gandalf", Cell::new(9, 9));
        player.lum = 101;
        player.umb = 7;
        player.hp = -1;
        SanctuaryRespawn::default().respawn(&mut player, 2000);
        assert_eq!(player.cells, vec![Cell::new(0, 0)]);
        assert_eq!(player.lum, 50);
        assert_eq!(player.umb, 3);
        assert_eq!(player.hp, player.max_stats().hp);
        assert_eq!(player.buclk, 2000 + RESPAWN_BUSY_TURNS * MS_PER_TURN);
    }

    #[test]
    fn trade_sends_a_cta_to_the_counterparty() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        let other = Player::new("player_saruman", "Saruman", Cell::new(0, 1));
        engine.world.players.insert(player.player.clone(), player);
        engine.world.players.insert(other.player.clone(), other);

        let mut command = action_command(ActionKind::Trade, Some("player_saruman"));
        command.entities.offer = Some(Offer {
            lum: 100,
            ..Offer::default()
        });
        command.entities.receive = Some(Offer {
            props: vec!["woodenclub".into()],
            ..Offer::default()
        });
        let outcome = engine.execute("player_gandalf", &command, 0).expect("trade");
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].to, vec!["player_saruman".to_string()]);
        match &outcome.events[0].event {
            GameEvent::Cta { offer, source, .. } => {
                assert_eq!(source, "player_gandalf");
                assert_eq!(offer.as_ref().expect("offer").lum, 100);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
