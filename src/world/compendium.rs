//! Prop templates. An item instance is stamped from a prop, which defines its
//! states, utilities, variables, equip slots and destructibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::world::abilities::{DamageType, DieRoll};
use crate::world::skills::Attribute;

pub const DEFAULT_ITEM_STATE: &str = "default";

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Gloves,
    Shoulders,
    LeftHand,
    RightHand,
}

pub const EQUIPMENT_SLOTS: [EquipmentSlot; 8] = [
    EquipmentSlot::Head,
    EquipmentSlot::Chest,
    EquipmentSlot::Legs,
    EquipmentSlot::Feet,
    EquipmentSlot::Gloves,
    EquipmentSlot::Shoulders,
    EquipmentSlot::LeftHand,
    EquipmentSlot::RightHand,
];

impl EquipmentSlot {
    pub fn id(self) -> &'static str {
        match self {
            EquipmentSlot::Head => "hd",
            EquipmentSlot::Chest => "ch",
            EquipmentSlot::Legs => "lg",
            EquipmentSlot::Feet => "ft",
            EquipmentSlot::Gloves => "gl",
            EquipmentSlot::Shoulders => "sh",
            EquipmentSlot::LeftHand => "lh",
            EquipmentSlot::RightHand => "rh",
        }
    }

    pub fn from_id(value: &str) -> Option<EquipmentSlot> {
        EQUIPMENT_SLOTS.iter().copied().find(|slot| slot.id() == value)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityCost {
    pub charges: i64,
    pub durability: i64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Utility {
    pub utility: String,
    pub description: String,
    pub cost: UtilityCost,
    pub state: Option<StateTransition>,
    /// Performed cost-free when the utility fires; the item's charge or
    /// durability cost already paid for it.
    pub ability: Option<String>,
    pub require_equipped: bool,
    pub range: i32,
    pub ticks: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PropVariable {
    pub variable: String,
    pub default: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub prop: String,
    pub name: String,
    pub description: String,
    pub durability: i64,
    pub charges: i64,
    pub collider: bool,
    pub takeable: bool,
    /// Items with an interior can be entered; the interior's location
    /// instance is the item id.
    pub interior: bool,
    pub equipment_slots: Vec<EquipmentSlot>,
    pub default_state: String,
    pub variables: Vec<PropVariable>,
    pub utilities: Vec<Utility>,
    /// Weapon damage when the item is equipped.
    pub die_roll: Option<DieRoll>,
}

impl Prop {
    pub fn equippable(&self) -> bool {
        !self.equipment_slots.is_empty()
    }

    pub fn utility(&self, name: &str) -> Option<&Utility> {
        self.utilities.iter().find(|utility| utility.utility == name)
    }

    pub fn variable(&self, name: &str) -> Option<&PropVariable> {
        self.variables.iter().find(|v| v.variable == name)
    }
}

pub struct Compendium {
    props: BTreeMap<String, Prop>,
}

impl Compendium {
    pub fn new(props: Vec<Prop>) -> Self {
        Compendium {
            props: props.into_iter().map(|p| (p.prop.clone(), p)).collect(),
        }
    }

    pub fn builtin() -> Self {
        Compendium::new(builtin_props())
    }

    pub fn get(&self, prop: &str) -> Option<&Prop> {
        self.props.get(prop)
    }

    pub fn contains(&self, prop: &str) -> bool {
        self.props.contains_key(prop)
    }

    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.values()
    }
}

fn simple_prop(prop: &str, name: &str, description: &str) -> Prop {
    Prop {
        prop: prop.into(),
        name: name.into(),
        description: description.into(),
        durability: 100,
        charges: 0,
        collider: false,
        takeable: true,
        interior: false,
        equipment_slots: Vec::new(),
        default_state: DEFAULT_ITEM_STATE.into(),
        variables: Vec::new(),
        utilities: Vec::new(),
        die_roll: None,
    }
}

pub fn builtin_props() -> Vec<Prop> {
    let mut woodenclub = simple_prop("woodenclub", "Wooden Club", "A simple wooden club.");
    woodenclub.equipment_slots = vec![EquipmentSlot::LeftHand, EquipmentSlot::RightHand];
    woodenclub.die_roll = Some(DieRoll {
        count: 1,
        sides: 6,
        damage_type: DamageType::Blunt,
        modifiers: vec![Attribute::Strength],
    });
    woodenclub.utilities = vec![Utility {
        utility: "swing".into(),
        description: "Swing the club with all your strength.".into(),
        cost: UtilityCost {
            charges: 0,
            durability: 1,
        },
        state: None,
        ability: Some("bruise".into()),
        require_equipped: true,
        range: 1,
        ticks: 1,
    }];

    let mut woodendoor = simple_prop("woodendoor", "Wooden Door", "A sturdy wooden door.");
    woodendoor.collider = true;
    woodendoor.takeable = false;
    woodendoor.variables = vec![PropVariable {
        variable: "doorsign".into(),
        default: String::new(),
    }];
    woodendoor.utilities = vec![
        Utility {
            utility: "open".into(),
            description: "Open the door.".into(),
            cost: UtilityCost::default(),
            state: Some(StateTransition {
                start: DEFAULT_ITEM_STATE.into(),
                end: "open".into(),
            }),
            ability: None,
            require_equipped: false,
            range: 1,
            ticks: 1,
        },
        Utility {
            utility: "close".into(),
            description: "Close the door.".into(),
            cost: UtilityCost::default(),
            state: Some(StateTransition {
                start: "open".into(),
                end: DEFAULT_ITEM_STATE.into(),
            }),
            ability: None,
            require_equipped: false,
            range: 1,
            ticks: 1,
        },
    ];

    let mut portal = simple_prop("portal", "Portal", "A shimmering tear in space.");
    portal.takeable = false;
    portal.charges = 100;
    portal.variables = vec![PropVariable {
        variable: "target".into(),
        default: String::new(),
    }];
    portal.utilities = vec![Utility {
        utility: "teleport".into(),
        description: "Step through the portal.".into(),
        cost: UtilityCost {
            charges: 5,
            durability: 0,
        },
        state: None,
        ability: Some("teleport".into()),
        require_equipped: false,
        range: 1,
        ticks: 1,
    }];

    let mut potionofhealth = simple_prop("potionofhealth", "Potion of Health", "A bottle of blood-red restorative.");
    potionofhealth.charges = 5;
    potionofhealth.utilities = vec![Utility {
        utility: "sip".into(),
        description: "Sip the potion.".into(),
        cost: UtilityCost {
            charges: 1,
            durability: 0,
        },
        state: None,
        ability: Some("bandage".into()),
        require_equipped: false,
        range: 1,
        ticks: 1,
    }];

    let mut tavern = simple_prop("tavern", "Tavern", "A timber-framed tavern.");
    tavern.collider = true;
    tavern.takeable = false;
    tavern.interior = true;

    vec![woodenclub, woodendoor, portal, potionofhealth, tavern]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_props_resolve_by_name() {
        let compendium = Compendium::builtin();
        assert!(compendium.contains("woodenclub"));
        assert!(compendium.contains("woodendoor"));
        assert!(!compendium.contains("vorpalblade"));
    }

    #[test]
    fn woodenclub_swing_requires_equipped() {
        let compendium = Compendium::builtin();
        let club = compendium.get("woodenclub").expect("prop");
        let swing = club.utility("swing").expect("utility");
        assert!(swing.require_equipped);
        assert_eq!(swing.ability.as_deref(), Some("bruise"));
        assert_eq!(swing.cost.durability, 1);
        assert!(club.equippable());
    }

    #[test]
    fn woodendoor_state_machine() {
        let compendium = Compendium::builtin();
        let door = compendium.get("woodendoor").expect("prop");
        let open = door.utility("open").expect("utility");
        let close = door.utility("close").expect("utility");
        let open_state = open.state.as_ref().expect("state");
        let close_state = close.state.as_ref().expect("state");
        assert_eq!(open_state.start, DEFAULT_ITEM_STATE);
        assert_eq!(open_state.end, "open");
        assert_eq!(close_state.start, "open");
        assert!(!door.takeable);
    }

    #[test]
    fn equipment_slot_ids_roundtrip() {
        for slot in EQUIPMENT_SLOTS {
            assert_eq!(EquipmentSlot::from_id(slot.id()), Some(slot));
        }
        assert_eq!(EquipmentSlot::from_id("zz"), None);
    }

    #[test]
    fn tavern_has_an_interior() {
        let compendium = Compendium::builtin();
        let tavern = compendium.get("tavern").expect("prop");
        assert!(tavern.interior);
        assert!(tavern.collider);
    }
}
