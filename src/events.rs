//! Typed outbound events. The engine returns these explicitly; delivery is a
//! transport concern outside this crate. Addressee sets are computed at
//! commit time from co-location, never from stale subscriptions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{Item, Monster, Player};
use crate::ir::commands::Offer;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Message,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitiesOp {
    Upsert,
    Replace,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum GameEvent {
    Action {
        action: String,
        source: String,
        target: Option<String>,
    },
    Feed {
        kind: FeedKind,
        message: String,
        variables: BTreeMap<String, String>,
    },
    Entities {
        op: EntitiesOp,
        players: Vec<Player>,
        monsters: Vec<Monster>,
        items: Vec<Item>,
    },
    Cta {
        name: String,
        source: String,
        message: String,
        offer: Option<Offer>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressedEvent {
    /// Player ids this event is delivered to.
    pub to: Vec<String>,
    pub event: GameEvent,
}

pub fn feed_message(to: Vec<String>, message: impl Into<String>) -> AddressedEvent {
    AddressedEvent {
        to,
        event: GameEvent::Feed {
            kind: FeedKind::Message,
            message: message.into(),
            variables: BTreeMap::new(),
        },
    }
}

pub fn feed_message_with_variables(
    to: Vec<String>,
    message: impl Into<String>,
    variables: BTreeMap<String, String>,
) -> AddressedEvent {
    AddressedEvent {
        to,
        event: GameEvent::Feed {
            kind: FeedKind::Message,
            message: message.into(),
            variables,
        },
    }
}

pub fn feed_error(to: impl Into<String>, message: impl Into<String>) -> AddressedEvent {
    AddressedEvent {
        to: vec![to.into()],
        event: GameEvent::Feed {
            kind: FeedKind::Error,
            message: message.into(),
            variables: BTreeMap::new(),
        },
    }
}

pub fn action_event(
    to: Vec<String>,
    action: impl Into<String>,
    source: impl Into<String>,
    target: Option<String>,
) -> AddressedEvent {
    AddressedEvent {
        to,
        event: GameEvent::Action {
            action: action.into(),
            source: source.into(),
            target,
        },
    }
}

pub fn entities_event(
    to: Vec<String>,
    op: EntitiesOp,
    players: Vec<Player>,
    monsters: Vec<Monster>,
    items: Vec<Item>,
) -> AddressedEvent {
    AddressedEvent {
        to,
        event: GameEvent::Entities {
            op,
            players,
            monsters,
            items,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let event = feed_error("player_gandalf", "Path is not traversable");
        let yaml = serde_yaml::to_string(&event).expect("serialize");
        assert!(yaml.contains("event: feed"));
        assert!(yaml.contains("kind: error"));
        let back: AddressedEvent = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn action_event_carries_source_and_target() {
        let event = action_event(
            vec!["player_gandalf".into()],
            "attack",
            "player_gandalf",
            Some("monster_goblin_1".into()),
        );
        match event.event {
            GameEvent::Action { action, source, target } => {
                assert_eq!(action, "attack");
                assert_eq!(source, "player_gandalf");
                assert_eq!(target.as_deref(), Some("monster_goblin_1"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
