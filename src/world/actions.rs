//! The action registry. Each action carries a token predicate: which query
//! positions its verb, target, item and offer must occupy for a command to
//! bind. Word order matters; "rejected look" never resolves to look.

use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use crate::world::settings::TICKS_PER_TURN;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Look,
    Say,
    Move,
    Take,
    Drop,
    Equip,
    Unequip,
    Inventory,
    Enter,
    Give,
    Rest,
    Attack,
    Configure,
    Trade,
}

impl ActionKind {
    pub fn id(self) -> &'static str {
        match self {
            ActionKind::Look => "look",
            ActionKind::Say => "say",
            ActionKind::Move => "move",
            ActionKind::Take => "take",
            ActionKind::Drop => "drop",
            ActionKind::Equip => "equip",
            ActionKind::Unequip => "unequip",
            ActionKind::Inventory => "inventory",
            ActionKind::Enter => "enter",
            ActionKind::Give => "give",
            ActionKind::Rest => "rest",
            ActionKind::Attack => "attack",
            ActionKind::Configure => "configure",
            ActionKind::Trade => "trade",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    Action,
    Target,
    Item,
    Offer,
    Receive,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub role: TokenRole,
    pub position: usize,
    pub optional: bool,
    pub entity_types: Vec<EntityKind>,
}

impl TokenSpec {
    fn new(role: TokenRole, position: usize, optional: bool, entity_types: &[EntityKind]) -> Self {
        TokenSpec {
            role,
            position,
            optional,
            entity_types: entity_types.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionPredicate {
    pub tokens: Vec<TokenSpec>,
}

impl ActionPredicate {
    pub fn token(&self, role: TokenRole) -> Option<&TokenSpec> {
        self.tokens.iter().find(|spec| spec.role == role)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action: ActionKind,
    pub synonyms: Vec<String>,
    pub description: String,
    pub predicate: ActionPredicate,
    pub range: i32,
    pub ticks: u32,
}

const CREATURES: [EntityKind; 2] = [EntityKind::Player, EntityKind::Monster];
const ANY: [EntityKind; 3] = [EntityKind::Player, EntityKind::Monster, EntityKind::Item];
const ITEMS: [EntityKind; 1] = [EntityKind::Item];
const PLAYERS: [EntityKind; 1] = [EntityKind::Player];

fn action(
    kind: ActionKind,
    synonyms: &[&str],
    description: &str,
    tokens: Vec<TokenSpec>,
    range: i32,
    ticks: u32,
) -> Action {
    Action {
        action: kind,
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        description: description.into(),
        predicate: ActionPredicate { tokens },
        range,
        ticks,
    }
}

pub fn builtin_actions() -> Vec<Action> {
    vec![
        action(
            ActionKind::Look,
            &["examine", "scan"],
            "Look at the surroundings or at a target.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, true, &ANY),
            ],
            0,
            0,
        ),
        action(
            ActionKind::Say,
            &["greet", "ask", "tell"],
            "Say something to those nearby.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, true, &CREATURES),
            ],
            0,
            1,
        ),
        action(
            ActionKind::Move,
            &["go", "walk"],
            "Move along a path of directions.",
            vec![TokenSpec::new(TokenRole::Action, 0, false, &[])],
            -1,
            0,
        ),
        action(
            ActionKind::Take,
            &["get", "pick"],
            "Take an item from the ground.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            1,
            2,
        ),
        action(
            ActionKind::Drop,
            &["discard"],
            "Drop an item from the inventory.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            0,
            2,
        ),
        action(
            ActionKind::Equip,
            &["wield", "wear"],
            "Equip an item from the inventory.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            0,
            2,
        ),
        action(
            ActionKind::Unequip,
            &["remove"],
            "Unequip an item back into the inventory.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            0,
            2,
        ),
        action(
            ActionKind::Inventory,
            &["inv"],
            "List carried and equipped items.",
            vec![TokenSpec::new(TokenRole::Action, 0, false, &[])],
            0,
            0,
        ),
        action(
            ActionKind::Enter,
            &[],
            "Enter an item's interior.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            1,
            2,
        ),
        action(
            ActionKind::Give,
            &[],
            "Give an item to a player.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Item, 1, false, &ITEMS),
                TokenSpec::new(TokenRole::Target, 3, false, &PLAYERS),
            ],
            1,
            2,
        ),
        action(
            ActionKind::Rest,
            &["sleep"],
            "Rest to recover your strength.",
            vec![TokenSpec::new(TokenRole::Action, 0, false, &[])],
            0,
            TICKS_PER_TURN * 10,
        ),
        action(
            ActionKind::Attack,
            &["hit", "strike"],
            "Attack a target with the equipped weapon.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ANY),
            ],
            1,
            1,
        ),
        action(
            ActionKind::Configure,
            &[],
            "Configure an item's variables.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Target, 1, false, &ITEMS),
            ],
            1,
            1,
        ),
        action(
            ActionKind::Trade,
            &["barter"],
            "Offer a trade to a player.",
            vec![
                TokenSpec::new(TokenRole::Action, 0, false, &[]),
                TokenSpec::new(TokenRole::Offer, 1, false, &[]),
                TokenSpec::new(TokenRole::Receive, 3, false, &[]),
                TokenSpec::new(TokenRole::Target, 5, false, &PLAYERS),
            ],
            1,
            1,
        ),
    ]
}

pub fn find_action(actions: &[Action], kind: ActionKind) -> Option<&Action> {
    actions.iter().find(|action| action.action == kind)
}
