use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::world::bestiary::Beast;
use crate::world::position::{Cell, Direction};
use crate::world::settings::LOCATION_INSTANCE;
use crate::world::skills::{
    attributes_from_skills, entity_level, entity_stats, Attributes, SkillLine, Stats,
};

/// Sentinel health of a dead creature; survives serialization without a
/// separate flag.
pub const DEAD_HP: i64 = -1;

static NEXT_MONSTER_ID: AtomicU32 = AtomicU32::new(1);

pub fn mint_monster_id(beast: &str) -> String {
    let n = NEXT_MONSTER_ID.fetch_add(1, Ordering::Relaxed);
    format!("monster_{beast}_{n}")
}

/// Committed movement record. Motion is purely a forward-dated clock; the
/// final location is already authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub path: Vec<Direction>,
    pub start: Cell,
    pub started_at: u64,
    pub duration: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player: String,
    pub name: String,
    /// Footprint cells; length 1 for normal creatures.
    pub cells: Vec<Cell>,
    pub instance: String,
    pub hp: i64,
    pub mp: i64,
    pub st: i64,
    pub ap: i64,
    pub lum: i64,
    pub umb: i64,
    pub skills: BTreeMap<SkillLine, u32>,
    /// Busy until this clock (ms); gates the next ticked action.
    pub buclk: u64,
    pub motion: Option<Motion>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cell: Cell) -> Self {
        let skills = BTreeMap::new();
        let stats = entity_stats(entity_level(&skills), &attributes_from_skills(&skills));
        Player {
            player: id.into(),
            name: name.into(),
            cells: vec![cell],
            instance: LOCATION_INSTANCE.to_string(),
            hp: stats.hp,
            mp: stats.mp,
            st: stats.st,
            ap: stats.ap,
            lum: 0,
            umb: 0,
            skills,
            buclk: 0,
            motion: None,
        }
    }

    pub fn attributes(&self) -> Attributes {
        attributes_from_skills(&self.skills)
    }

    pub fn level(&self) -> i64 {
        entity_level(&self.skills)
    }

    pub fn max_stats(&self) -> Stats {
        entity_stats(self.level(), &self.attributes())
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_busy(&self, now: u64) -> bool {
        self.buclk > now
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub monster: String,
    pub name: String,
    pub beast: String,
    pub level: i64,
    pub cells: Vec<Cell>,
    pub instance: String,
    pub hp: i64,
    pub mp: i64,
    pub st: i64,
    pub ap: i64,
    pub skills: BTreeMap<SkillLine, u32>,
    pub buclk: u64,
    pub motion: Option<Motion>,
}

impl Monster {
    pub fn spawn(beast: &Beast, cell: Cell) -> Self {
        let stats = entity_stats(beast.level, &attributes_from_skills(&beast.skills));
        Monster {
            monster: mint_monster_id(&beast.beast),
            name: beast.beast.clone(),
            beast: beast.beast.clone(),
            level: beast.level,
            cells: vec![cell],
            instance: LOCATION_INSTANCE.to_string(),
            hp: stats.hp,
            mp: stats.mp,
            st: stats.st,
            ap: stats.ap,
            skills: beast.skills.clone(),
            buclk: 0,
            motion: None,
        }
    }

    pub fn attributes(&self) -> Attributes {
        attributes_from_skills(&self.skills)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_busy(&self, now: u64) -> bool {
        self.buclk > now
    }
}
