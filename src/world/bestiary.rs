use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::world::abilities::{DamageType, DieRoll};
use crate::world::skills::{Attribute, SkillLine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beast {
    pub beast: String,
    pub description: String,
    pub level: i64,
    pub attack: DieRoll,
    pub skills: BTreeMap<SkillLine, u32>,
}

pub struct Bestiary {
    beasts: BTreeMap<String, Beast>,
}

impl Bestiary {
    pub fn new(beasts: Vec<Beast>) -> Self {
        Bestiary {
            beasts: beasts.into_iter().map(|b| (b.beast.clone(), b)).collect(),
        }
    }

    pub fn builtin() -> Self {
        Bestiary::new(builtin_beasts())
    }

    pub fn get(&self, beast: &str) -> Option<&Beast> {
        self.beasts.get(beast)
    }

    pub fn beasts(&self) -> impl Iterator<Item = &Beast> {
        self.beasts.values()
    }
}

pub fn builtin_beasts() -> Vec<Beast> {
    vec![
        Beast {
            beast: "goblin".into(),
            description: "A hunched green creature with a rusty blade.".into(),
            level: 1,
            attack: DieRoll {
                count: 1,
                sides: 4,
                damage_type: DamageType::Slashing,
                modifiers: vec![Attribute::Dexterity],
            },
            skills: BTreeMap::from([(SkillLine::Dirtyfighting, 1)]),
        },
        Beast {
            beast: "giantspider".into(),
            description: "A spider the size of a dog.".into(),
            level: 2,
            attack: DieRoll {
                count: 1,
                sides: 6,
                damage_type: DamageType::Piercing,
                modifiers: vec![Attribute::Dexterity],
            },
            skills: BTreeMap::from([(SkillLine::Beast, 2)]),
        },
        Beast {
            beast: "dragon".into(),
            description: "An ancient scaled terror.".into(),
            level: 10,
            attack: DieRoll {
                count: 3,
                sides: 8,
                damage_type: DamageType::Normal,
                modifiers: vec![Attribute::Strength],
            },
            skills: BTreeMap::from([(SkillLine::Beast, 10), (SkillLine::Arcane, 8)]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_beasts_resolve() {
        let bestiary = Bestiary::builtin();
        assert_eq!(bestiary.get("goblin").expect("beast").level, 1);
        assert_eq!(bestiary.get("dragon").expect("beast").level, 10);
        assert!(bestiary.get("kraken").is_none());
    }
}
