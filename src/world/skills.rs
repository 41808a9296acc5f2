use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BASE_ATTRIBUTE: i64 = 10;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLine {
    Exploration,
    Firstaid,
    Dirtyfighting,
    Beast,
    Arcane,
}

pub const SKILL_LINES: [SkillLine; 5] = [
    SkillLine::Exploration,
    SkillLine::Firstaid,
    SkillLine::Dirtyfighting,
    SkillLine::Beast,
    SkillLine::Arcane,
];

impl SkillLine {
    pub fn id(self) -> &'static str {
        match self {
            SkillLine::Exploration => "exploration",
            SkillLine::Firstaid => "firstaid",
            SkillLine::Dirtyfighting => "dirtyfighting",
            SkillLine::Beast => "beast",
            SkillLine::Arcane => "arcane",
        }
    }

    /// Display name, used as a searchable document alongside the id.
    pub fn name(self) -> &'static str {
        match self {
            SkillLine::Exploration => "exploration",
            SkillLine::Firstaid => "first aid",
            SkillLine::Dirtyfighting => "dirty fighting",
            SkillLine::Beast => "beast mastery",
            SkillLine::Arcane => "arcane arts",
        }
    }

    pub fn from_id(value: &str) -> Option<SkillLine> {
        SKILL_LINES.iter().copied().find(|line| line.id() == value)
    }

    /// Attribute gains per level of this line.
    fn gains(self) -> &'static [Attribute] {
        match self {
            SkillLine::Exploration => &[Attribute::Dexterity, Attribute::Constitution],
            SkillLine::Firstaid => &[Attribute::Constitution, Attribute::Mind],
            SkillLine::Dirtyfighting => &[Attribute::Strength, Attribute::Dexterity],
            SkillLine::Beast => &[Attribute::Strength, Attribute::Constitution],
            SkillLine::Arcane => &[Attribute::Mind, Attribute::Chaos],
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Dexterity,
    Constitution,
    Mind,
    Faith,
    Chaos,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub mind: i64,
    pub faith: i64,
    pub chaos: i64,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes {
            strength: BASE_ATTRIBUTE,
            dexterity: BASE_ATTRIBUTE,
            constitution: BASE_ATTRIBUTE,
            mind: BASE_ATTRIBUTE,
            faith: BASE_ATTRIBUTE,
            chaos: BASE_ATTRIBUTE,
        }
    }
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> i64 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Constitution => self.constitution,
            Attribute::Mind => self.mind,
            Attribute::Faith => self.faith,
            Attribute::Chaos => self.chaos,
        }
    }

    fn add(&mut self, attribute: Attribute, amount: i64) {
        match attribute {
            Attribute::Strength => self.strength += amount,
            Attribute::Dexterity => self.dexterity += amount,
            Attribute::Constitution => self.constitution += amount,
            Attribute::Mind => self.mind += amount,
            Attribute::Faith => self.faith += amount,
            Attribute::Chaos => self.chaos += amount,
        }
    }
}

pub fn attributes_from_skills(skills: &BTreeMap<SkillLine, u32>) -> Attributes {
    let mut attributes = Attributes::default();
    for (line, &level) in skills {
        for &gain in line.gains() {
            attributes.add(gain, level as i64);
        }
    }
    attributes
}

/// d20-style modifier of the highest listed attribute.
pub fn calculate_modifier(modifiers: &[Attribute], attributes: &Attributes) -> i64 {
    let best = modifiers
        .iter()
        .map(|&attribute| attributes.get(attribute))
        .max()
        .unwrap_or(BASE_ATTRIBUTE);
    (best - BASE_ATTRIBUTE).div_euclid(2)
}

pub fn entity_level(skills: &BTreeMap<SkillLine, u32>) -> i64 {
    skills.values().copied().max().unwrap_or(1).max(1) as i64
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: i64,
    pub mp: i64,
    pub st: i64,
    pub ap: i64,
}

/// Maximum resource stats for a creature of the given level.
pub fn entity_stats(level: i64, attributes: &Attributes) -> Stats {
    Stats {
        hp: level * (10 + calculate_modifier(&[Attribute::Constitution], attributes)),
        mp: level * (10 + calculate_modifier(&[Attribute::Mind], attributes)),
        st: level * (10 + calculate_modifier(&[Attribute::Dexterity], attributes)),
        ap: 4,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Hp,
    Mp,
    St,
    Ap,
}

impl Resource {
    pub fn describe(self) -> &'static str {
        match self {
            Resource::Hp => "health points",
            Resource::Mp => "mana points",
            Resource::St => "stamina points",
            Resource::Ap => "action points",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    Lum,
    Umb,
}

impl CurrencyKind {
    pub fn id(self) -> &'static str {
        match self {
            CurrencyKind::Lum => "lum",
            CurrencyKind::Umb => "umb",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_floors_toward_negative_infinity() {
        let mut attributes = Attributes::default();
        attributes.strength = 13;
        assert_eq!(calculate_modifier(&[Attribute::Strength], &attributes), 1);
        attributes.strength = 9;
        assert_eq!(calculate_modifier(&[Attribute::Strength], &attributes), -1);
        attributes.strength = 10;
        assert_eq!(calculate_modifier(&[Attribute::Strength], &attributes), 0);
    }

    #[test]
    fn modifier_takes_highest_attribute() {
        let mut attributes = Attributes::default();
        attributes.strength = 12;
        attributes.dexterity = 16;
        assert_eq!(
            calculate_modifier(&[Attribute::Strength, Attribute::Dexterity], &attributes),
            3
        );
    }

    #[test]
    fn skills_raise_attributes() {
        let mut skills = BTreeMap::new();
        skills.insert(SkillLine::Dirtyfighting, 2);
        let attributes = attributes_from_skills(&skills);
        assert_eq!(attributes.strength, BASE_ATTRIBUTE + 2);
        assert_eq!(attributes.dexterity, BASE_ATTRIBUTE + 2);
        assert_eq!(attributes.mind, BASE_ATTRIBUTE);
    }

    #[test]
    fn level_is_highest_skill() {
        let mut skills = BTreeMap::new();
        assert_eq!(entity_level(&skills), 1);
        skills.insert(SkillLine::Exploration, 3);
        skills.insert(SkillLine::Arcane, 5);
        assert_eq!(entity_level(&skills), 5);
    }

    #[test]
    fn stats_scale_with_level() {
        let attributes = Attributes::default();
        let stats = entity_stats(2, &attributes);
        assert_eq!(stats.hp, 20);
        assert_eq!(stats.ap, 4);
    }

    #[test]
    fn skill_line_ids_roundtrip() {
        for line in SKILL_LINES {
            assert_eq!(SkillLine::from_id(line.id()), Some(line));
        }
        assert_eq!(SkillLine::from_id("smithing"), None);
    }
}
