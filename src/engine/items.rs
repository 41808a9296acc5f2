//! Item manipulation: the inventory lifecycle, configuration and utility
//! use. Every rejection carries the exact user-visible string and leaves the
//! world untouched.

use crate::engine::{CommandOutcome, ExecutionEngine, QuestTrigger};
use crate::entities::{Item, ItemLocation, Player};
use crate::events::{entities_event, EntitiesOp};
use crate::telemetry::logging;
use crate::world::actions::ActionKind;
use crate::world::compendium::{EquipmentSlot, Utility};
use crate::world::position::{entity_in_range, Cell};

impl ExecutionEngine {
    pub(crate) fn take_item(
        &mut self,
        actor: &str,
        item_id: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;

        let takeable = self
            .compendium
            .get(&item.prop)
            .map(|prop| prop.takeable)
            .unwrap_or(false);
        if !takeable {
            return Err(format!("{} cannot be taken", item.name));
        }
        let action = self.action(ActionKind::Take);
        let in_range = item
            .cells()
            .map(|cells| entity_in_range(&player.cells, cells, action.range))
            .unwrap_or(false);
        if !in_range {
            return Err(format!("{} is not in range", item.name));
        }
        if !item.owned_by(actor) {
            return Err(format!("{} does not own {}", player.name, item.name));
        }

        let ticks = action.ticks;
        player.buclk = self.busy_until(now, ticks);
        item.location = ItemLocation::Inventory {
            owner: actor.to_string(),
        };
        self.finish_item_mutation(player, item)
    }

    pub(crate) fn drop_item(
        &mut self,
        actor: &str,
        item_id: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        if !item.in_inventory_of(actor) {
            return Err(format!("{} is not in inventory", item.name));
        }
        let ticks = self.action(ActionKind::Drop).ticks;
        player.buclk = self.busy_until(now, ticks);
        item.location = ItemLocation::Geohash {
            cells: player.cells.clone(),
            instance: player.instance.clone(),
        };
        self.finish_item_mutation(player, item)
    }

    /// Equip into the prop's first supported slot.
    pub(crate) fn equip_item_in_default_slot(
        &mut self,
        actor: &str,
        item_id: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let item = self.fetch_item(item_id)?;
        let slot = self
            .compendium
            .get(&item.prop)
            .and_then(|prop| prop.equipment_slots.first().copied())
            .ok_or_else(|| format!("{} is not equippable", item.name))?;
        self.equip_item(actor, item_id, slot, now)
    }

    pub fn equip_item(
        &mut self,
        actor: &str,
        item_id: &str,
        slot: EquipmentSlot,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        if !item.in_inventory_of(actor) {
            return Err(format!("{} is not in inventory", item.name));
        }
        let prop = self
            .compendium
            .get(&item.prop)
            .ok_or_else(|| format!("{} is not equippable", item.name))?;
        if !prop.equippable() {
            return Err(format!("{} is not equippable", item.name));
        }
        if !prop.equipment_slots.contains(&slot) {
            return Err(format!("{} cannot be equipped in {}", item.name, slot.id()));
        }

        // Whatever occupies the slot moves back to the inventory first.
        let displaced: Vec<String> = self
            .world
            .items
            .values()
            .filter(|other| {
                other.item != item.item
                    && matches!(
                        &other.location,
                        ItemLocation::Equipped { owner, slot: occupied }
                            if owner == actor && *occupied == slot
                    )
            })
            .map(|other| other.item.clone())
            .collect();
        let mut outcome = CommandOutcome::default();
        for other_id in displaced {
            if let Ok(mut other) = self.fetch_item(&other_id) {
                other.location = ItemLocation::Inventory {
                    owner: actor.to_string(),
                };
                let snapshot = other.clone();
                self.commit_item(other);
                outcome.events.push(entities_event(
                    vec![actor.to_string()],
                    EntitiesOp::Upsert,
                    Vec::new(),
                    Vec::new(),
                    vec![snapshot],
                ));
            }
        }

        let ticks = self.action(ActionKind::Equip).ticks;
        player.buclk = self.busy_until(now, ticks);
        item.location = ItemLocation::Equipped {
            owner: actor.to_string(),
            slot,
        };
        outcome.merge(self.finish_item_mutation(player, item)?);
        Ok(outcome)
    }

    pub(crate) fn unequip_item(
        &mut self,
        actor: &str,
        item_id: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        if !item.equipped_by(actor) {
            return Err(format!("{} is not equipped in the required slot", item.name));
        }
        let ticks = self.action(ActionKind::Unequip).ticks;
        player.buclk = self.busy_until(now, ticks);
        item.location = ItemLocation::Inventory {
            owner: actor.to_string(),
        };
        self.finish_item_mutation(player, item)
    }

    pub(crate) fn enter_item(
        &mut self,
        actor: &str,
        item_id: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let item = self.fetch_item(item_id)?;
        let interior = self
            .compendium
            .get(&item.prop)
            .map(|prop| prop.interior)
            .unwrap_or(false);
        if !interior || !item.location.is_on_grid() {
            return Err(format!("{} cannot be entered", item.name));
        }
        let action = self.action(ActionKind::Enter);
        let in_range = item
            .cells()
            .map(|cells| entity_in_range(&player.cells, cells, action.range))
            .unwrap_or(false);
        if !in_range {
            return Err(format!("{} is not in range", item.name));
        }

        let ticks = action.ticks;
        player.buclk = self.busy_until(now, ticks);
        // The item's id is the interior location instance.
        player.instance = item.item.clone();
        player.cells = vec![Cell::new(0, 0)];
        player.motion = None;
        let snapshot = player.clone();
        self.commit_player(player);
        logging::log_game(&format!("{actor} enters {}", item.item));

        Ok(CommandOutcome {
            events: vec![entities_event(
                vec![actor.to_string()],
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            )],
            triggers: vec![QuestTrigger::Enter {
                actor: actor.to_string(),
                item: item_id.to_string(),
            }],
        })
    }

    pub(crate) fn give_item(
        &mut self,
        actor: &str,
        item_id: &str,
        to: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        if !item.in_inventory_of(actor) {
            return Err(format!("{} is not in inventory", item.name));
        }
        let receiver = self
            .world
            .players
            .get(to)
            .ok_or_else(|| format!("{to} is out of range"))?;
        let action = self.action(ActionKind::Give);
        if !entity_in_range(&player.cells, &receiver.cells, action.range) {
            return Err(format!("{} is out of range", receiver.name));
        }

        let ticks = action.ticks;
        player.buclk = self.busy_until(now, ticks);
        item.location = ItemLocation::Inventory {
            owner: to.to_string(),
        };
        let mut outcome = self.finish_item_mutation(player, item)?;
        outcome.triggers.push(QuestTrigger::Give {
            item: item_id.to_string(),
            from: actor.to_string(),
            to: to.to_string(),
        });
        Ok(outcome)
    }

    /// Apply `key=value` assignments to an item's variables. Keys the prop
    /// does not declare are ignored.
    pub(crate) fn configure_item(
        &mut self,
        actor: &str,
        item_id: &str,
        assignments: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        let action = self.action(ActionKind::Configure);
        if !self.item_reachable(&player, &item, actor, action.range) {
            return Err(format!("{} is not in range", item.name));
        }
        if !item.configurable_by(actor) {
            return Err(format!("{} does not own {}", player.name, item.name));
        }
        let prop = self
            .compendium
            .get(&item.prop)
            .ok_or_else(|| format!("{} cannot be configured", item.name))?;

        for assignment in assignments.split_whitespace() {
            if let Some((key, value)) = assignment.split_once('=') {
                if prop.variable(key).is_some() {
                    item.variables.insert(key.to_string(), value.to_string());
                }
            }
        }

        let ticks = action.ticks;
        player.buclk = self.busy_until(now, ticks);
        self.finish_item_mutation(player, item)
    }

    pub(crate) fn use_item(
        &mut self,
        actor: &str,
        item_id: &str,
        utility_name: &str,
        target: Option<&str>,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let player = self.fetch_player(actor)?;
        let mut item = self.fetch_item(item_id)?;
        let utility = self.can_use_item(&player, &item, utility_name, actor)?.clone();

        // The backing ability resolves first; if it rejects, the item keeps
        // its state, charges and durability. A configured "target" variable
        // overrides the command's target, the way a keyed portal always
        // teleports to its destination.
        let override_target = item.variables.get("target").cloned();
        let performed = match &utility.ability {
            Some(ability) => {
                let bound = override_target.as_deref().or(target);
                Some(self.perform_ability(actor, bound, ability, now, true)?)
            }
            None => None,
        };

        // Refetch: the ability may have moved or otherwise changed the actor.
        let mut player = self.fetch_player(actor)?;
        player.buclk = self.busy_until(now, utility.ticks);
        if let Some(transition) = &utility.state {
            item.state = transition.end.clone();
        }
        item.charges -= utility.cost.charges;
        item.durability -= utility.cost.durability;
        logging::log_game(&format!("{actor} uses {} on {}", utility.utility, item.item));

        let mut outcome = performed.unwrap_or_default();
        outcome.merge(self.finish_item_mutation(player, item)?);
        Ok(outcome)
    }

    /// The full precondition ladder for a utility, in order: prop, utility,
    /// state, range, ownership, equipment, charges and durability.
    fn can_use_item<'a>(
        &'a self,
        player: &Player,
        item: &Item,
        utility_name: &str,
        actor: &str,
    ) -> Result<&'a Utility, String> {
        let prop = self
            .compendium
            .get(&item.prop)
            .ok_or_else(|| format!("{} cannot be used", item.name))?;
        let utility = prop
            .utility(utility_name)
            .ok_or_else(|| format!("{} cannot {}", item.name, utility_name))?;
        if let Some(transition) = &utility.state {
            if item.state != transition.start {
                return Err(format!(
                    "{} cannot {} in its current state",
                    item.name, utility_name
                ));
            }
        }
        if !self.item_reachable(player, item, actor, utility.range) {
            return Err(format!("{} is not in range", item.name));
        }
        if !item.owned_by(actor) {
            return Err(format!("{} does not own {}", player.name, item.name));
        }
        if utility.require_equipped && !item.equipped_by(actor) {
            return Err(format!("{} is not equipped in the required slot", item.name));
        }
        if (utility.cost.charges > 0 && item.charges < utility.cost.charges)
            || (utility.cost.durability > 0 && item.durability < utility.cost.durability)
        {
            return Err(format!("{} has no charges or durability left", item.name));
        }
        Ok(utility)
    }

    /// Carried items are always reachable; grid items must be within range.
    fn item_reachable(&self, player: &Player, item: &Item, actor: &str, range: i32) -> bool {
        if item.carried_by(actor) {
            return true;
        }
        match item.cells() {
            Some(cells) => {
                item.location_instance() == Some(player.instance.as_str())
                    && entity_in_range(&player.cells, cells, range)
            }
            None => false,
        }
    }

    /// Commit the actor and the item, then upsert both to everyone nearby.
    fn finish_item_mutation(&mut self, player: Player, item: Item) -> Result<CommandOutcome, String> {
        let cells = player.cells.clone();
        let instance = player.instance.clone();
        let player_snapshot = player.clone();
        let item_snapshot = item.clone();
        self.commit_player(player);
        self.commit_item(item);
        let nearby = self.nearby_player_ids(&cells, &instance);
        Ok(CommandOutcome {
            events: vec![entities_event(
                nearby,
                EntitiesOp::Upsert,
                vec![player_snapshot],
                Vec::new(),
                vec![item_snapshot],
            )],
            triggers: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{action_command, test_engine};
    use crate::engine::ExecutionEngine;
    use crate::events::GameEvent;
    use crate::ir::commands::{CommandEntities, CommandVariables, CommandVerb, GameCommand};
    use crate::world::settings::LOCATION_INSTANCE;

    fn engine_with_club() -> (ExecutionEngine, String) {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let club = {
            let prop = engine.compendium.get("woodenclub").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = club.item.clone();
        engine.world.items.insert(id.clone(), club);
        (engine, id)
    }

    fn step_clock(engine: &ExecutionEngine) -> u64 {
        engine
            .world
            .players
            .get("player_gandalf")
            .expect("player")
            .buclk
    }

    #[test]
    fn lifecycle_walks_the_location_enum() {
        let (mut engine, club) = engine_with_club();

        let take = action_command(ActionKind::Take, Some(&club));
        engine.execute("player_gandalf", &take, 0).expect("take");
        assert!(engine.world.items.get(&club).expect("club").in_inventory_of("player_gandalf"));

        let now = step_clock(&engine);
        let equip = action_command(ActionKind::Equip, Some(&club));
        engine.execute("player_gandalf", &equip, now).expect("equip");
        assert!(engine.world.items.get(&club).expect("club").equipped_by("player_gandalf"));

        let now = step_clock(&engine);
        let unequip = action_command(ActionKind::Unequip, Some(&club));
        engine.execute("player_gandalf", &unequip, now).expect("unequip");
        assert!(engine.world.items.get(&club).expect("club").in_inventory_of("player_gandalf"));

        let now = step_clock(&engine);
        let drop = action_command(ActionKind::Drop, Some(&club));
        engine.execute("player_gandalf", &drop, now).expect("drop");
        let dropped = engine.world.items.get(&club).expect("club");
        assert!(dropped.location.is_on_grid());
        assert_eq!(dropped.cells(), Some(&[Cell::new(0, 0)][..]));
    }

    #[test]
    fn equipping_into_an_unsupported_slot_fails_verbatim() {
        let (mut engine, club) = engine_with_club();
        engine.execute("player_gandalf", &action_command(ActionKind::Take, Some(&club)), 0).expect("take");
        let now = step_clock(&engine);
        let rejection = engine
            .equip_item("player_gandalf", &club, EquipmentSlot::Head, now)
            .expect_err("wrong slot");
        assert_eq!(rejection, "Wooden Club cannot be equipped in hd");
    }

    #[test]
    fn equipping_displaces_the_current_occupant() {
        let (mut engine, first) = engine_with_club();
        let second = {
            let prop = engine.compendium.get("woodenclub").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let second_id = second.item.clone();
        engine.world.items.insert(second_id.clone(), second);

        engine.execute("player_gandalf", &action_command(ActionKind::Take, Some(&first)), 0).expect("take");
        let now = step_clock(&engine);
        engine.execute("player_gandalf", &action_command(ActionKind::Take, Some(&second_id)), now).expect("take");
        let now = step_clock(&engine);
        engine.execute("player_gandalf", &action_command(ActionKind::Equip, Some(&first)), now).expect("equip");
        let now = step_clock(&engine);
        engine.execute("player_gandalf", &action_command(ActionKind::Equip, Some(&second_id)), now).expect("equip");

        assert!(engine.world.items.get(&first).expect("first").in_inventory_of("player_gandalf"));
        assert!(engine.world.items.get(&second_id).expect("second").equipped_by("player_gandalf"));
    }

    #[test]
    fn untakeable_items_stay_put() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let door = {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = door.item.clone();
        engine.world.items.insert(id.clone(), door);

        let rejection = engine
            .execute("player_gandalf", &action_command(ActionKind::Take, Some(&id)), 0)
            .expect_err("untakeable");
        assert_eq!(rejection.message, "Wooden Door cannot be taken");
        assert!(engine.world.items.get(&id).expect("door").location.is_on_grid());
    }

    #[test]
    fn swinging_an_unequipped_club_names_the_slot_requirement() {
        let (mut engine, club) = engine_with_club();
        engine.execute("player_gandalf", &action_command(ActionKind::Take, Some(&club)), 0).expect("take");
        let now = step_clock(&engine);
        let command = GameCommand {
            verb: CommandVerb::Utility {
                item: club.clone(),
                utility: "swing".into(),
            },
            entities: CommandEntities {
                self_id: "player_gandalf".into(),
                target: Some("player_gandalf".into()),
                item: Some(club.clone()),
                ..CommandEntities::default()
            },
            variables: None,
        };
        let rejection = engine
            .execute("player_gandalf", &command, now)
            .expect_err("unequipped");
        assert_eq!(rejection.message, "Wooden Club is not equipped in the required slot");
    }

    #[test]
    fn a_door_opens_once_and_only_once() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let door = {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = door.item.clone();
        engine.world.items.insert(id.clone(), door);

        engine.use_item("player_gandalf", &id, "open", None, 0).expect("open");
        assert_eq!(engine.world.items.get(&id).expect("door").state, "open");

        let now = step_clock(&engine);
        let rejection = engine
            .use_item("player_gandalf", &id, "open", None, now)
            .expect_err("already open");
        assert_eq!(rejection, "Wooden Door cannot open in its current state");

        let now = step_clock(&engine);
        engine.use_item("player_gandalf", &id, "close", None, now).expect("close");
        assert_eq!(engine.world.items.get(&id).expect("door").state, "default");
    }

    #[test]
    fn a_drained_potion_refuses_another_sip() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let mut potion = {
            let prop = engine.compendium.get("potionofhealth").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 0), LOCATION_INSTANCE)
        };
        potion.location = ItemLocation::Inventory {
            owner: "player_gandalf".into(),
        };
        potion.charges = 0;
        let id = potion.item.clone();
        engine.world.items.insert(id.clone(), potion);

        let rejection = engine
            .use_item("player_gandalf", &id, "sip", None, 0)
            .expect_err("empty");
        assert_eq!(rejection, "Potion of Health has no charges or durability left");
    }

    #[test]
    fn sipping_the_potion_heals_without_mana() {
        let mut engine = test_engine();
        let mut player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        player.hp = 1;
        player.mp = 0;
        engine.world.players.insert(player.player.clone(), player);
        let mut potion = {
            let prop = engine.compendium.get("potionofhealth").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 0), LOCATION_INSTANCE)
        };
        potion.location = ItemLocation::Inventory {
            owner: "player_gandalf".into(),
        };
        let id = potion.item.clone();
        engine.world.items.insert(id.clone(), potion);

        engine.use_item("player_gandalf", &id, "sip", None, 0).expect("sip");
        let player = engine.world.players.get("player_gandalf").expect("player");
        assert!(player.hp > 1);
        // Cost-free execution leaves the empty mana pool alone.
        assert_eq!(player.mp, 0);
        assert_eq!(engine.world.items.get(&id).expect("potion").charges, 4);
    }

    #[test]
    fn an_unkeyed_portal_rejects_without_spending_a_charge() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let portal = {
            let prop = engine.compendium.get("portal").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = portal.item.clone();
        engine.world.items.insert(id.clone(), portal);

        // The target variable is still its empty default, so the teleport
        // rejects; the portal and the actor must come through untouched.
        let rejection = engine
            .use_item("player_gandalf", &id, "teleport", None, 0)
            .expect_err("no destination");
        assert!(rejection.ends_with("is not a valid target for teleport"));
        assert_eq!(engine.world.items.get(&id).expect("portal").charges, 100);
        let player = engine.world.players.get("player_gandalf").expect("player");
        assert_eq!(player.buclk, 0);
    }

    #[test]
    fn give_hands_the_item_over_and_fires_the_trigger() {
        let (mut engine, club) = engine_with_club();
        let receiver = Player::new("player_saruman", "Saruman", Cell::new(0, 1));
        engine.world.players.insert(receiver.player.clone(), receiver);
        engine.execute("player_gandalf", &action_command(ActionKind::Take, Some(&club)), 0).expect("take");

        let now = step_clock(&engine);
        let mut command = action_command(ActionKind::Give, Some("player_saruman"));
        command.entities.item = Some(club.clone());
        let outcome = engine.execute("player_gandalf", &command, now).expect("give");
        assert!(engine.world.items.get(&club).expect("club").in_inventory_of("player_saruman"));
        assert_eq!(
            outcome.triggers,
            vec![QuestTrigger::Give {
                item: club.clone(),
                from: "player_gandalf".into(),
                to: "player_saruman".into(),
            }]
        );
    }

    #[test]
    fn entering_the_tavern_switches_the_instance() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let tavern = {
            let prop = engine.compendium.get("tavern").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = tavern.item.clone();
        engine.world.items.insert(id.clone(), tavern);

        let outcome = engine
            .execute("player_gandalf", &action_command(ActionKind::Enter, Some(&id)), 0)
            .expect("enter");
        let player = engine.world.players.get("player_gandalf").expect("player");
        assert_eq!(player.instance, id);
        assert_eq!(player.cells, vec![Cell::new(0, 0)]);
        assert_eq!(
            outcome.triggers,
            vec![QuestTrigger::Enter {
                actor: "player_gandalf".into(),
                item: id.clone(),
            }]
        );
    }

    #[test]
    fn configure_applies_known_variables_only() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let door = {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        let id = door.item.clone();
        engine.world.items.insert(id.clone(), door);

        let mut command = action_command(ActionKind::Configure, Some(&id));
        command.variables = Some(CommandVariables {
            query: format!("configure {id} doorsign=Welcome color=red"),
            query_irrelevant: "doorsign=Welcome color=red".into(),
        });
        engine.execute("player_gandalf", &command, 0).expect("configure");
        let door = engine.world.items.get(&id).expect("door");
        assert_eq!(door.variables.get("doorsign").map(String::as_str), Some("Welcome"));
        assert!(!door.variables.contains_key("color"));
    }

    #[test]
    fn configure_respects_the_config_owner() {
        let mut engine = test_engine();
        let player = Player::new("player_gandalf", "Gandalf", Cell::new(0, 0));
        engine.world.players.insert(player.player.clone(), player);
        let mut door = {
            let prop = engine.compendium.get("woodendoor").expect("prop").clone();
            Item::spawn(&prop, Cell::new(0, 1), LOCATION_INSTANCE)
        };
        door.config_owner = "player_saruman".into();
        let id = door.item.clone();
        engine.world.items.insert(id.clone(), door);

        let mut command = action_command(ActionKind::Configure, Some(&id));
        command.variables = Some(CommandVariables {
            query: format!("configure {id} doorsign=Mine"),
            query_irrelevant: "doorsign=Mine".into(),
        });
        let rejection = engine
            .execute("player_gandalf", &command, 0)
            .expect_err("not the owner");
        assert_eq!(rejection.message, "Gandalf does not own Wooden Door");
    }

    #[test]
    fn events_from_a_mutation_upsert_both_entities() {
        let (mut engine, club) = engine_with_club();
        let outcome = engine
            .execute("player_gandalf", &action_command(ActionKind::Take, Some(&club)), 0)
            .expect("take");
        assert_eq!(outcome.events.len(), 1);
        match &outcome.events[0].event {
            GameEvent::Entities { op, players, items, .. } => {
                assert_eq!(*op, EntitiesOp::Upsert);
                assert_eq!(players.len(), 1);
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
