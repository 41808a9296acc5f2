//! Deterministic combat resolution. All randomness flows through the
//! engine's seeded generator, so two engines started from the same seed and
//! fed the same commands land every blow identically.

use crate::engine::{CommandOutcome, ExecutionEngine, QuestTrigger};
use crate::entities::{Item, Monster, Player, DEAD_HP};
use crate::events::{action_event, entities_event, feed_message, EntitiesOp};
use crate::telemetry::logging;
use crate::world::abilities::{DamageType, DieRoll};
use crate::world::actions::ActionKind;
use crate::world::compendium::EquipmentSlot;
use crate::world::position::{entity_in_range, Cell};
use crate::world::skills::{calculate_modifier, Attribute, Attributes};

/// Linear congruential generator. Small, seedable and good enough for dice;
/// never used for anything security-sensitive.
#[derive(Clone, Debug)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        GameRng {
            state: seed.wrapping_add(0x9E3779B97F4A7C15),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        self.state
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [1, sides].
    pub fn roll(&mut self, sides: i64) -> i64 {
        if sides <= 1 {
            return sides.max(1);
        }
        1 + (self.next_f64() * sides as f64) as i64
    }

    pub fn d20(&mut self) -> i64 {
        self.roll(20)
    }
}

/// Sum a die roll. Negative sides roll healing, so the total is negated.
pub fn roll_dice(die: &DieRoll, rng: &mut GameRng) -> i64 {
    let sides = i64::from(die.sides).abs();
    let mut total = 0;
    for _ in 0..die.count {
        total += rng.roll(sides);
    }
    if die.sides < 0 {
        -total
    } else {
        total
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BodyPart {
    Torso,
    Arms,
    Legs,
    Head,
}

impl BodyPart {
    /// Torso 75%, arms 10%, legs 10%, head 5%.
    pub fn sample(rng: &mut GameRng) -> Self {
        let roll = rng.next_f64();
        if roll < 0.75 {
            BodyPart::Torso
        } else if roll < 0.85 {
            BodyPart::Arms
        } else if roll < 0.95 {
            BodyPart::Legs
        } else {
            BodyPart::Head
        }
    }

    /// Equipment slots that absorb a hit to this part.
    pub fn slots(self) -> &'static [EquipmentSlot] {
        match self {
            BodyPart::Head => &[EquipmentSlot::Head],
            BodyPart::Arms => &[EquipmentSlot::Gloves, EquipmentSlot::Shoulders],
            BodyPart::Legs => &[EquipmentSlot::Feet, EquipmentSlot::Legs],
            BodyPart::Torso => &[EquipmentSlot::Chest],
        }
    }

    /// Head hits double, limb hits glance.
    pub fn scale_damage(self, damage: i64) -> i64 {
        match self {
            BodyPart::Head => damage * 2,
            BodyPart::Arms | BodyPart::Legs => (damage as f64 * 0.8).floor() as i64,
            BodyPart::Torso => damage,
        }
    }
}

/// Opposed d20 roll. The attacker's modifiers come from the weapon or
/// procedure; defenders always evade on dexterity.
pub fn attack_roll(
    attacker: &Attributes,
    defender: &Attributes,
    modifiers: &[Attribute],
    rng: &mut GameRng,
) -> bool {
    let attack = rng.d20() + calculate_modifier(modifiers, attacker);
    let defend = rng.d20() + calculate_modifier(&[Attribute::Dexterity], defender);
    attack >= defend
}

fn unarmed_die() -> DieRoll {
    DieRoll {
        count: 1,
        sides: 4,
        damage_type: DamageType::Blunt,
        modifiers: vec![Attribute::Strength, Attribute::Dexterity],
    }
}

pub(crate) enum Defender {
    Player(Player),
    Monster(Monster),
    Item(Item),
}

impl Defender {
    fn id(&self) -> &str {
        match self {
            Defender::Player(p) => &p.player,
            Defender::Monster(m) => &m.monster,
            Defender::Item(i) => &i.item,
        }
    }

    fn cells(&self) -> Option<&[Cell]> {
        match self {
            Defender::Player(p) => Some(&p.cells),
            Defender::Monster(m) => Some(&m.cells),
            Defender::Item(i) => i.cells(),
        }
    }

    pub(crate) fn attributes(&self) -> Attributes {
        match self {
            Defender::Player(p) => p.attributes(),
            Defender::Monster(m) => m.attributes(),
            Defender::Item(_) => Attributes::default(),
        }
    }
}

impl ExecutionEngine {
    pub(crate) fn execute_attack(
        &mut self,
        actor: &str,
        target: &str,
        now: u64,
    ) -> Result<CommandOutcome, String> {
        let mut player = self.fetch_player(actor)?;
        let defender = self.fetch_defender(target)?;

        let action = self.action(ActionKind::Attack);
        let range = action.range;
        let ticks = action.ticks;
        let in_range = defender
            .cells()
            .map(|cells| entity_in_range(&player.cells, cells, range))
            .unwrap_or(false);
        if !in_range {
            return Err("Target is out of range".to_string());
        }

        player.buclk = self.busy_until(now, ticks);

        // Weapon: an equipped hand item whose prop carries a damage die.
        let weapon = self.equipped_weapon(actor);
        let die = match &weapon {
            Some((_, die)) => die.clone(),
            None => unarmed_die(),
        };

        let attacker_attrs = player.attributes();
        let hit = attack_roll(&attacker_attrs, &defender.attributes(), &die.modifiers, &mut self.rng);

        let cells = player.cells.clone();
        let instance = player.instance.clone();
        let attacker_name = player.name.clone();
        self.commit_player(player);
        let target_name = self
            .entity_name(target)
            .unwrap_or_else(|| target.to_string());

        let nearby = self.nearby_player_ids(&cells, &instance);
        let mut outcome = CommandOutcome::default();
        let tag = if hit { ActionKind::Attack.id() } else { "miss" };
        outcome.events.push(action_event(
            nearby.clone(),
            tag,
            actor,
            Some(target.to_string()),
        ));

        if !hit {
            logging::log_combat(&format!("{actor} misses {target}"));
            outcome.events.push(feed_message(
                nearby,
                format!("{attacker_name} attacks {target_name} but misses"),
            ));
            return Ok(outcome);
        }

        let part = BodyPart::sample(&mut self.rng);
        let raw = roll_dice(&die, &mut self.rng) + calculate_modifier(&die.modifiers, &attacker_attrs);
        let damage = part.scale_damage(raw.max(0));
        logging::log_combat(&format!("{actor} hits {target} for {damage}"));
        outcome.events.push(feed_message(
            nearby.clone(),
            format!("{attacker_name} hits {target_name} for {damage} damage"),
        ));

        // A swung weapon wears by one point per landed blow.
        if let Some((weapon_id, _)) = weapon {
            if let Ok(mut item) = self.fetch_item(&weapon_id) {
                item.durability -= 1;
                self.commit_item(item);
            }
        }

        self.apply_attack_damage(actor, defender, damage, part, nearby, now, &mut outcome)?;
        Ok(outcome)
    }

    fn fetch_defender(&self, target: &str) -> Result<Defender, String> {
        if let Some(player) = self.world.players.get(target) {
            return Ok(Defender::Player(player.clone()));
        }
        if let Some(monster) = self.world.monsters.get(target) {
            return Ok(Defender::Monster(monster.clone()));
        }
        if let Some(item) = self.world.items.get(target) {
            return Ok(Defender::Item(item.clone()));
        }
        Err("Target is out of range".to_string())
    }

    fn equipped_weapon(&self, actor: &str) -> Option<(String, DieRoll)> {
        self.world
            .items
            .values()
            .filter(|item| {
                matches!(
                    &item.location,
                    crate::entities::ItemLocation::Equipped { owner, slot }
                        if owner == actor
                            && matches!(slot, EquipmentSlot::LeftHand | EquipmentSlot::RightHand)
                )
            })
            .find_map(|item| {
                let die = self.compendium.get(&item.prop)?.die_roll.clone()?;
                Some((item.item.clone(), die))
            })
    }

    /// Commit damage to whatever was struck, wear the armor in the struck
    /// slot, and resolve a kill when health crosses zero.
    pub(crate) fn apply_attack_damage(
        &mut self,
        attacker: &str,
        defender: Defender,
        damage: i64,
        part: BodyPart,
        nearby: Vec<String>,
        now: u64,
        outcome: &mut CommandOutcome,
    ) -> Result<(), String> {
        let defender_id = defender.id().to_string();
        match defender {
            Defender::Item(mut item) => {
                item.durability -= damage;
                let snapshot = item.clone();
                self.commit_item(item);
                outcome.events.push(entities_event(
                    nearby,
                    EntitiesOp::Upsert,
                    Vec::new(),
                    Vec::new(),
                    vec![snapshot],
                ));
            }
            Defender::Monster(mut monster) => {
                self.wear_struck_armor(&defender_id, part);
                let was_alive = monster.is_alive();
                monster.hp -= damage;
                if was_alive && !monster.is_alive() {
                    monster.hp = DEAD_HP;
                    let snapshot = monster.clone();
                    self.commit_monster(monster);
                    outcome.events.push(entities_event(
                        nearby,
                        EntitiesOp::Upsert,
                        Vec::new(),
                        vec![snapshot.clone()],
                        Vec::new(),
                    ));
                    outcome.events.push(feed_message(
                        vec![attacker.to_string()],
                        format!("{} has died", snapshot.name),
                    ));
                    self.reward_kill(attacker, snapshot.level, outcome);
                    outcome.triggers.push(QuestTrigger::Kill {
                        killer: attacker.to_string(),
                        victim: defender_id,
                    });
                } else {
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
            }
            Defender::Player(mut victim) => {
                self.wear_struck_armor(&defender_id, part);
                let was_alive = victim.is_alive();
                victim.hp -= damage;
                if was_alive && !victim.is_alive() {
                    victim.hp = DEAD_HP;
                    let level = victim.level();
                    let snapshot = victim.clone();
                    self.commit_player(victim);
                    outcome.events.push(entities_event(
                        nearby,
                        EntitiesOp::Upsert,
                        vec![snapshot.clone()],
                        Vec::new(),
                        Vec::new(),
                    ));
                    outcome.events.push(feed_message(
                        vec![attacker.to_string(), defender_id.clone()],
                        format!("{} has died", snapshot.name),
                    ));
                    self.reward_kill(attacker, level, outcome);
                    outcome.triggers.push(QuestTrigger::Kill {
                        killer: attacker.to_string(),
                        victim: defender_id.clone(),
                    });
                    self.respawn_player(&defender_id, now, outcome)?;
                } else {
                    let snapshot = victim.clone();
                    self.commit_player(victim);
                    outcome.events.push(entities_event(
                        nearby,
                        EntitiesOp::Upsert,
                        vec![snapshot],
                        Vec::new(),
                        Vec::new(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// First equipped item of the defender in one of the struck slots loses a
    /// point of durability.
    fn wear_struck_armor(&mut self, defender: &str, part: BodyPart) {
        let struck = self.world.items.values().find_map(|item| {
            match &item.location {
                crate::entities::ItemLocation::Equipped { owner, slot }
                    if owner == defender && part.slots().contains(slot) =>
                {
                    Some(item.item.clone())
                }
                _ => None,
            }
        });
        if let Some(item_id) = struck {
            if let Ok(mut item) = self.fetch_item(&item_id) {
                item.durability -= 1;
                self.commit_item(item);
            }
        }
    }

    /// Kills pay the killer luminance scaled by the victim's level.
    fn reward_kill(&mut self, killer: &str, victim_level: i64, outcome: &mut CommandOutcome) {
        if let Some(mut player) = self.world.players.get(killer).cloned() {
            player.lum += 10 * victim_level.max(1);
            let snapshot = player.clone();
            self.commit_player(player);
            outcome.events.push(entities_event(
                vec![killer.to_string()],
                EntitiesOp::Upsert,
                vec![snapshot],
                Vec::new(),
                Vec::new(),
            ));
        }
    }

    /// A dead player comes back through the respawn collaborator; the second
    /// upsert announces the revived state at the sanctuary.
    pub(crate) fn respawn_player(
        &mut self,
        victim: &str,
        now: u64,
        outcome: &mut CommandOutcome,
    ) -> Result<(), String> {
        let mut player = self.fetch_player(victim)?;
        self.respawn.respawn(&mut player, now);
        let snapshot = player.clone();
        let nearby = self.nearby_player_ids(&snapshot.cells, &snapshot.instance);
        self.commit_player(player);
        outcome.events.push(entities_event(
            nearby,
            EntitiesOp::Upsert,
            vec![snapshot],
            Vec::new(),
            Vec::new(),
        ));
        Ok(())
    }
}
