//! Vocabulary retrieval. Scores abilities, item utilities and actions
//! against the query. Utilities are keyed per (item, utility) pair so two
//! items sharing a utility name never collide in the token positions.

use crate::entities::Item;
use crate::ir::tokenize::{document_score, TokenPositions};
use crate::world::abilities::Ability;
use crate::world::actions::Action;
use crate::world::compendium::Utility;

const RETENTION_THRESHOLD: f64 = 0.6;

pub fn utility_key(item_id: &str, utility: &str) -> String {
    format!("{item_id}#{utility}")
}

/// Vocabulary retained for the query, with matched token positions keyed by
/// ability name, utility key or action id.
pub struct VocabRetrieval<'a> {
    pub abilities: Vec<&'a Ability>,
    pub item_utilities: Vec<(&'a Item, &'a Utility)>,
    pub actions: Vec<&'a Action>,
    pub token_positions: TokenPositions,
}

pub fn game_actions_ir<'a>(
    query_tokens: &[String],
    abilities: &'a [Ability],
    item_utilities: &[(&'a Item, &'a Utility)],
    actions: &'a [Action],
) -> VocabRetrieval<'a> {
    let mut token_positions = TokenPositions::new();

    let abilities = abilities
        .iter()
        .filter(|ability| {
            let (matched, score) = document_score(query_tokens, &ability.ability);
            if score > RETENTION_THRESHOLD {
                token_positions.insert(ability.ability.clone(), matched);
                true
            } else {
                false
            }
        })
        .collect();

    let item_utilities = item_utilities
        .iter()
        .filter(|(item, utility)| {
            let (matched, score) = document_score(query_tokens, &utility.utility);
            if score > RETENTION_THRESHOLD {
                token_positions.insert(utility_key(&item.item, &utility.utility), matched);
                true
            } else {
                false
            }
        })
        .copied()
        .collect();

    let actions = actions
        .iter()
        .filter(|action| {
            let documents =
                std::iter::once(action.action.id().to_string()).chain(action.synonyms.iter().cloned());
            for document in documents {
                let (matched, score) = document_score(query_tokens, &document);
                if score > RETENTION_THRESHOLD {
                    token_positions.insert(action.action.id().to_string(), matched);
                    return true;
                }
            }
            false
        })
        .collect();

    VocabRetrieval {
        abilities,
        item_utilities,
        actions,
        token_positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::tokenize::tokenize;
    use crate::world::abilities::builtin_abilities;
    use crate::world::actions::{builtin_actions, ActionKind};
    use crate::world::compendium::Compendium;
    use crate::world::position::Cell;
    use crate::world::settings::LOCATION_INSTANCE;

    #[test]
    fn synonyms_retrieve_the_action() {
        let actions = builtin_actions();
        let retrieved = game_actions_ir(&tokenize("wield club"), &[], &[], &actions);
        assert_eq!(retrieved.actions.len(), 1);
        assert_eq!(retrieved.actions[0].action, ActionKind::Equip);
        // Positions are keyed by the canonical id, not the synonym.
        assert!(retrieved.token_positions.contains_key("equip"));
    }

    #[test]
    fn abilities_retrieve_with_typos() {
        let abilities = builtin_abilities();
        let retrieved = game_actions_ir(&tokenize("bandge gandalf"), &abilities, &[], &[]);
        assert_eq!(retrieved.abilities.len(), 1);
        assert_eq!(retrieved.abilities[0].ability, "bandage");
    }

    #[test]
    fn utilities_key_per_item_instance() {
        let compendium = Compendium::builtin();
        let prop = compendium.get("woodendoor").expect("prop");
        let inner = Item::spawn(prop, Cell::new(0, 0), LOCATION_INSTANCE);
        let outer = Item::spawn(prop, Cell::new(0, 1), LOCATION_INSTANCE);
        let open = prop.utility("open").expect("utility");
        let pairs = vec![(&inner, open), (&outer, open)];
        let retrieved = game_actions_ir(&tokenize("open door"), &[], &pairs, &[]);
        assert_eq!(retrieved.item_utilities.len(), 2);
        assert!(retrieved
            .token_positions
            .contains_key(&utility_key(&inner.item, "open")));
        assert!(retrieved
            .token_positions
            .contains_key(&utility_key(&outer.item, "open")));
    }

    #[test]
    fn unrelated_queries_retrieve_nothing() {
        let actions = builtin_actions();
        let abilities = builtin_abilities();
        let retrieved = game_actions_ir(&tokenize("xyzzy plugh"), &abilities, &[], &actions);
        assert!(retrieved.abilities.is_empty());
        assert!(retrieved.actions.is_empty());
    }
}
