//! Ability execution. An ability is validated front to back, then its
//! procedures run in order against the seeded generator. Validation order is
//! existence, predicate, range, cost; the first failure rejects the whole
//! cast with nothing mutated.

use crate::engine::combat::{attack_roll, roll_dice, BodyPart, Defender};
use crate::engine::{CommandOutcome, ExecutionEngine};
use crate::entities::EntityKind;
use crate::events::{action_event, entities_event, EntitiesOp};
use crate::telemetry::logging;
use crate::world::abilities::{
    find_ability, Ability, ProcedureTarget, StateEffect, StateField, StateOp, StateValue,
};
use crate::world::position::{entity_in_range, Cell};
use crate::world::skills::{calculate_modifier, entity_stats, CurrencyKind, Resource};

impl ExecutionEngine {
    pub(crate) fn perform_ability(
        &mut self,
        actor: &str,
        target: Option<&str>,
        ability_name: &str,
        now: u64,
        ignore_cost: bool,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let ability = find_ability(&self.abilities, ability_name)
            .cloned()
            .ok_or_else(|| format!("{ability_name} is not a known ability"))?;

        if !ability.predicate.self_types.contains(&EntityKind::Player) {
            return Err(format!(
                "{} cannot perform {}",
                player.name, ability.ability
            ));
        }

        // Abilities with no target types always bind to the caster.
        let target_id = if ability.predicate.target_types.is_empty() {
            actor.to_string()
        } else {
            target.unwrap_or(actor).to_string()
        };
        self.check_target_predicate(&player.name, &target_id, actor, &ability)?;

        if target_id != actor {
            let defender = self
                .world_cells_of(&target_id)
                .ok_or_else(|| "Target is out of range".to_string())?;
            if !entity_in_range(&player.cells, &defender, ability.range) {
                return Err("Target is out of range".to_string());
            }
        }

        if !ignore_cost {
            self.check_ability_cost(&player, &ability)?;
        }

        player.buclk = self.busy_until(now, ability.ticks());
        if !ignore_cost {
            player.hp -= ability.cost.hp;
            player.mp -= ability.cost.mp;
            player.st -= ability.cost.st;
            player.ap -= ability.cost.ap;
            player.lum -= ability.cost.lum;
            player.umb -= ability.cost.umb;
        }
        let caster_attrs = player.attributes();
        let cells = player.cells.clone();
        let instance = player.instance.clone();
        let snapshot = player.clone();
        self.commit_player(player);
        logging::log_combat(&format!("{actor} performs {} on {target_id}", ability.ability));

        let nearby = self.nearby_player_ids(&cells, &instance);
        let mut outcome = CommandOutcome::default();
        outcome.events.push(action_event(
            nearby.clone(),
            ability.ability.clone(),
            actor,
            Some(target_id.clone()),
        ));
        outcome.events.push(entities_event(
            vec![actor.to_string()],
            EntitiesOp::Upsert,
            vec![snapshot],
            Vec::new(),
            Vec::new(),
        ));

        for procedure in &ability.procedures {
            let subject = match procedure.target {
                ProcedureTarget::Caster => actor.to_string(),
                ProcedureTarget::Target => target_id.clone(),
            };

            if let Some(die) = &procedure.die_roll {
                if die.sides < 0 {
                    // Healing dice always land.
                    let amount =
                        -roll_dice(die, &mut self.rng) + calculate_modifier(&die.modifiers, &caster_attrs);
                    self.apply_healing(&subject, amount.max(0), nearby.clone(), &mut outcome)?;
                } else {
                    let defender = self.fetch_ability_defender(&subject)?;
                    let hit = if procedure.modifiers.is_empty() {
                        let attack = self.rng.d20();
                        let defend = self.rng.d20();
                        attack > defend
                    } else {
                        attack_roll(
                            &caster_attrs,
                            &defender.attributes(),
                            &procedure.modifiers,
                            &mut self.rng,
                        )
                    };
                    if !hit {
                        continue;
                    }
                    let part = BodyPart::sample(&mut self.rng);
                    let raw =
                        roll_dice(die, &mut self.rng) + calculate_modifier(&die.modifiers, &caster_attrs);
                    let damage = part.scale_damage(raw.max(0));
                    self.apply_attack_damage(
                        actor,
                        defender,
                        damage,
                        part,
                        nearby.clone(),
                        now,
                        &mut outcome,
                    )?;
                }
            }

            for state in &procedure.states {
                self.apply_state_effect(&subject, &target_id, state, nearby.clone(), &mut outcome)?;
            }
        }

        Ok(outcome)
    }

    fn check_target_predicate(
        &self,
        caster_name: &str,
        target_id: &str,
        actor: &str,
        ability: &Ability,
    ) -> Result<(), String> {
        let predicate = &ability.predicate;
        if target_id == actor {
            if !predicate.target_types.is_empty() && !predicate.target_self_allowed {
                return Err(format!(
                    "{caster_name} is not a valid target for {}",
                    ability.ability
                ));
            }
            return Ok(());
        }
        let kind = EntityKind::from_entity_id(target_id);
        let valid = kind
            .map(|kind| predicate.target_types.contains(&kind))
            .unwrap_or(false);
        if !valid {
            let name = self.entity_name(target_id).unwrap_or_else(|| target_id.to_string());
            return Err(format!("{name} is not a valid target for {}", ability.ability));
        }
        Ok(())
    }

    fn check_ability_cost(&self, player: &crate::entities::Player, ability: &Ability) -> Result<(), String> {
        let cost = &ability.cost;
        let stats = [
            (Resource::Hp, player.hp, cost.hp),
            (Resource::Mp, player.mp, cost.mp),
            (Resource::St, player.st, cost.st),
            (Resource::Ap, player.ap, cost.ap),
        ];
        for (resource, have, need) in stats {
            if have < need {
                return Err(format!(
                    "Not enough {} to {}.",
                    resource.describe(),
                    ability.ability
                ));
            }
        }
        for (kind, have, need) in [
            (CurrencyKind::Lum, player.lum, cost.lum),
            (CurrencyKind::Umb, player.umb, cost.umb),
        ] {
            if have < need {
                return Err(format!(
                    "{} does not have {} {}.",
                    player.name,
                    need,
                    kind.id()
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn entity_name(&self, id: &str) -> Option<String> {
        if let Some(player) = self.world.players.get(id) {
            return Some(player.name.clone());
        }
        if let Some(monster) = self.world.monsters.get(id) {
            return Some(monster.name.clone());
        }
        self.world.items.get(id).map(|item| item.name.clone())
    }

    fn world_cells_of(&self, id: &str) -> Option<Vec<Cell>> {
        if let Some(player) = self.world.players.get(id) {
            return Some(player.cells.clone());
        }
        if let Some(monster) = self.world.monsters.get(id) {
            return Some(monster.cells.clone());
        }
        self.world.items.get(id).and_then(|item| item.cells().map(<[Cell]>::to_vec))
    }

    fn fetch_ability_defender(&self, id: &str) -> Result<Defender, String> {
        if let Some(player) = self.world.players.get(id) {
            return Ok(Defender::Player(player.clone()));
        }
        if let Some(monster) = self.world.monsters.get(id) {
            return Ok(Defender::Monster(monster.clone()));
        }
        if let Some(item) = self.world.items.get(id) {
            return Ok(Defender::Item(item.clone()));
        }
        Err("Target is out of range".to_string())
    }

    fn apply_healing(
        &mut self,
        subject: &str,
        amount: i64,
        nearby: Vec<String>,
        outcome: &mut CommandOutcome,
    ) -> Result<(), String> {
        if let Some(mut player) = self.world.players.get(subject).cloned() {
            let max = player.max_stats().hp;
            player.hp = (player.hp + amount).min(max);
            let snapshot = player.clone();
            self.commit_player(player);
            outcome.events.push(entities_event(
                nearby,
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            ));
            return Ok(());
        }
        if let Some(mut monster) = self.world.monsters.get(subject).cloned() {
            let max = entity_stats(monster.level, &monster.attributes()).hp;
            monster.hp = (monster.hp + amount).min(max);
            let snapshot = monster.clone();
            self.commit_monster(monster);
            outcome.events.push(entities_event(
                nearby,
                EntitiesOp::Upsert,
                Vec::new(),
                vec![snapshot],
                Vec::new(),
            ));
            return Ok(());
        }
        Err(format!("{subject} is not in the world"))
    }

    /// Apply one declarative state change. `TargetLocation` resolves against
    /// the command's bound target at execution time.
    fn apply_state_effect(
        &mut self,
        subject: &str,
        bound_target: &str,
        effect: &StateEffect,
        nearby: Vec<String>,
        outcome: &mut CommandOutcome,
    ) -> Result<(), String> {
        if effect.field == StateField::Location {
            let destination = match &effect.value {
                StateValue::TargetLocation => self
                    .world_cells_of(bound_target)
                    .ok_or_else(|| "Target is out of range".to_string())?,
                StateValue::Number(_) => return Ok(()),
            };
            let instance = self.instance_of(bound_target);
            if let Some(mut player) = self.world.players.get(subject).cloned() {
                player.cells = destination;
                if let Some(instance) = instance {
                    player.instance = instance;
                }
                player.motion = None;
                let snapshot = player.clone();
                let announce = self.nearby_player_ids(&snapshot.cells, &snapshot.instance);
                self.commit_player(player);
                outcome.events.push(entities_event(
                    announce,
                    EntitiesOp::Upsert,
                    vec![snapshot],
                    Vec::new(),
                    Vec::new(),
                ));
            }
            return Ok(());
        }

        let delta = match &effect.value {
            StateValue::Number(n) => *n,
            StateValue::TargetLocation => return Ok(()),
        };
        if let Some(mut player) = self.world.players.get(subject).cloned() {
            let field = match effect.field {
                StateField::Hp => &mut player.hp,
                StateField::Mp => &mut player.mp,
                StateField::St => &mut player.st,
                StateField::Ap => &mut player.ap,
                StateField::Lum => &mut player.lum,
                StateField::Umb => &mut player.umb,
                StateField::Location => return Ok(()),
            };
            apply_state_op(field, effect.op, delta);
            let snapshot = player.clone();
            self.commit_player(player);
            outcome.events.push(entities_event(
                nearby,
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            ));
        } else if let Some(mut monster) = self.world.monsters.get(subject).cloned() {
            let field = match effect.field {
                StateField::Hp => &mut monster.hp,
                StateField::Mp => &mut monster.mp,
                StateField::St => &mut monster.st,
                StateField::Ap => &mut monster.ap,
                // Monsters carry no currencies.
                _ => return Ok(()),
            };
            apply_state_op(field, effect.op, delta);
            let snapshot = monster.clone();
            self.commit_monster(monster);
            outcome.events.push(entities_event(
                nearby,
                EntitiesOp::Upsert,
                Vec::new(),
                vec![snapshot],
                Vec::new(),
            ));
        }
        Ok(())
    }

    fn instance_of(&self, id: &str) -> Option<String> {
        if let Some(player) = self.world.players.get(id) {
            return Some(player.instance.clone());
        }
        if let Some(monster) = self.world.monsters.get(id) {
            return Some(monster.instance.clone());
        }
        self.world
            .items
            .get(id)
            .and_then(|item| item.location_instance().map(str::to_string))
    }
}

fn apply_state_op(field: &mut i64, op: StateOp, value: i64) {
    match op {
        StateOp::Change => *field = value,
        StateOp::Add => *field += value,
        StateOp::Subtract => *field -= value,
    }
}
