//! Ability templates. Abilities are data: an ordered list of procedures plus
//! a cost, a range and a targeting predicate. The execution engine interprets
//! them; nothing here mutates world state.

use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use crate::world::settings::TICKS_PER_TURN;
use crate::world::skills::Attribute;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityType {
    Offensive,
    Healing,
    Neutral,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Blunt,
    Slashing,
    Piercing,
    Necrotic,
    Healing,
    Normal,
}

/// `sides < 0` rolls healing (negative damage).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DieRoll {
    pub count: u32,
    pub sides: i32,
    pub damage_type: DamageType,
    pub modifiers: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityPredicate {
    pub self_types: Vec<EntityKind>,
    pub target_types: Vec<EntityKind>,
    pub target_self_allowed: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureTarget {
    Caster,
    Target,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateField {
    Hp,
    Mp,
    St,
    Ap,
    Lum,
    Umb,
    Location,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateOp {
    Change,
    Add,
    Subtract,
}

/// Values are patched at execution time; `TargetLocation` resolves to the
/// bound target's cells and instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateValue {
    Number(i64),
    TargetLocation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateEffect {
    pub field: StateField,
    pub op: StateOp,
    pub value: StateValue,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcedureEffect {
    pub target: ProcedureTarget,
    pub ticks: u32,
    pub die_roll: Option<DieRoll>,
    /// Modifiers for the attack roll, separate from the damage roll's.
    pub modifiers: Vec<Attribute>,
    pub states: Vec<StateEffect>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityCost {
    pub hp: i64,
    pub mp: i64,
    pub st: i64,
    pub ap: i64,
    pub lum: i64,
    pub umb: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub ability: String,
    pub kind: AbilityType,
    pub description: String,
    pub procedures: Vec<ProcedureEffect>,
    pub cost: AbilityCost,
    pub range: i32,
    pub predicate: AbilityPredicate,
}

impl Ability {
    pub fn ticks(&self) -> u32 {
        self.procedures.iter().map(|p| p.ticks).sum()
    }
}

fn creature_predicate(target_self_allowed: bool) -> AbilityPredicate {
    AbilityPredicate {
        self_types: vec![EntityKind::Player, EntityKind::Monster],
        target_types: vec![EntityKind::Player, EntityKind::Monster],
        target_self_allowed,
    }
}

fn damage_procedure(die: DieRoll, ticks: u32) -> ProcedureEffect {
    let modifiers = die.modifiers.clone();
    ProcedureEffect {
        target: ProcedureTarget::Target,
        ticks,
        die_roll: Some(die),
        modifiers,
        states: Vec::new(),
    }
}

pub fn builtin_abilities() -> Vec<Ability> {
    vec![
        Ability {
            ability: "bandage".into(),
            kind: AbilityType::Healing,
            description: "Bandages the target's wounds.".into(),
            procedures: vec![damage_procedure(
                DieRoll {
                    count: 1,
                    sides: -6,
                    damage_type: DamageType::Healing,
                    modifiers: vec![Attribute::Constitution],
                },
                TICKS_PER_TURN,
            )],
            cost: AbilityCost {
                mp: 1,
                ..AbilityCost::default()
            },
            range: 1,
            predicate: creature_predicate(true),
        },
        Ability {
            ability: "heal".into(),
            kind: AbilityType::Healing,
            description: "Heal yourself.".into(),
            procedures: vec![ProcedureEffect {
                target: ProcedureTarget::Caster,
                ticks: TICKS_PER_TURN,
                die_roll: Some(DieRoll {
                    count: 1,
                    sides: -6,
                    damage_type: DamageType::Healing,
                    modifiers: vec![Attribute::Constitution],
                }),
                modifiers: vec![Attribute::Constitution],
                states: Vec::new(),
            }],
            cost: AbilityCost {
                mp: 1,
                ..AbilityCost::default()
            },
            range: 1,
            predicate: AbilityPredicate {
                self_types: vec![EntityKind::Player, EntityKind::Monster],
                target_types: Vec::new(),
                target_self_allowed: true,
            },
        },
        Ability {
            ability: "bruise".into(),
            kind: AbilityType::Offensive,
            description: "A blunt strike.".into(),
            procedures: vec![damage_procedure(
                DieRoll {
                    count: 2,
                    sides: 8,
                    damage_type: DamageType::Blunt,
                    modifiers: vec![Attribute::Strength],
                },
                1,
            )],
            cost: AbilityCost {
                mp: 1,
                ..AbilityCost::default()
            },
            range: 1,
            predicate: creature_predicate(false),
        },
        Ability {
            ability: "doubleslash".into(),
            kind: AbilityType::Offensive,
            description: "Slashes the target twice.".into(),
            procedures: vec![
                damage_procedure(
                    DieRoll {
                        count: 1,
                        sides: 8,
                        damage_type: DamageType::Slashing,
                        modifiers: vec![Attribute::Strength, Attribute::Dexterity],
                    },
                    1,
                ),
                damage_procedure(
                    DieRoll {
                        count: 1,
                        sides: 8,
                        damage_type: DamageType::Slashing,
                        modifiers: vec![Attribute::Strength, Attribute::Dexterity],
                    },
                    1,
                ),
            ],
            cost: AbilityCost {
                mp: 1,
                ..AbilityCost::default()
            },
            range: 1,
            predicate: creature_predicate(false),
        },
        Ability {
            ability: "disintegrate".into(),
            kind: AbilityType::Offensive,
            description: "Disintegrates the target.".into(),
            procedures: vec![damage_procedure(
                DieRoll {
                    count: 5,
                    sides: 20,
                    damage_type: DamageType::Necrotic,
                    modifiers: vec![Attribute::Chaos],
                },
                TICKS_PER_TURN / 2,
            )],
            cost: AbilityCost {
                mp: 3,
                ..AbilityCost::default()
            },
            range: 1,
            predicate: creature_predicate(false),
        },
        Ability {
            ability: "teleport".into(),
            kind: AbilityType::Neutral,
            description: "Teleport to the target location.".into(),
            procedures: vec![ProcedureEffect {
                target: ProcedureTarget::Caster,
                ticks: TICKS_PER_TURN,
                die_roll: None,
                modifiers: Vec::new(),
                states: vec![StateEffect {
                    field: StateField::Location,
                    op: StateOp::Change,
                    value: StateValue::TargetLocation,
                }],
            }],
            cost: AbilityCost {
                mp: 5,
                ..AbilityCost::default()
            },
            range: -1,
            predicate: AbilityPredicate {
                self_types: vec![EntityKind::Player, EntityKind::Monster],
                target_types: vec![EntityKind::Player, EntityKind::Monster, EntityKind::Item],
                target_self_allowed: false,
            },
        },
    ]
}

pub fn find_ability<'a>(abilities: &'a [Ability], name: &str) -> Option<&'a Ability> {
    abilities.iter().find(|ability| ability.ability == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandage_requires_a_target_but_heal_does_not() {
        let abilities = builtin_abilities();
        let bandage = find_ability(&abilities, "bandage").expect("bandage");
        let heal = find_ability(&abilities, "heal").expect("heal");
        assert!(!bandage.predicate.target_types.is_empty());
        assert!(bandage.predicate.target_self_allowed);
        assert!(heal.predicate.target_types.is_empty());
    }

    #[test]
    fn bruise_forbids_self_targeting() {
        let abilities = builtin_abilities();
        let bruise = find_ability(&abilities, "bruise").expect("bruise");
        assert!(!bruise.predicate.target_self_allowed);
        assert_eq!(bruise.kind, AbilityType::Offensive);
    }

    #[test]
    fn ticks_sum_over_procedures() {
        let abilities = builtin_abilities();
        let doubleslash = find_ability(&abilities, "doubleslash").expect("doubleslash");
        assert_eq!(doubleslash.ticks(), 2);
    }

    #[test]
    fn teleport_is_unbounded_range() {
        let abilities = builtin_abilities();
        let teleport = find_ability(&abilities, "teleport").expect("teleport");
        assert!(teleport.range < 0);
        assert_eq!(
            teleport.procedures[0].states[0].value,
            StateValue::TargetLocation
        );
    }
}
