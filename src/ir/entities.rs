//! Entity retrieval. Scores nearby players, monsters, items and skill lines
//! against the query and keeps everything above the retention threshold,
//! recording which query positions matched which entity.

use crate::entities::{Item, Monster, Player};
use crate::ir::tokenize::{documents_score, MatchedTokenPositions, TokenPositions};
use crate::world::skills::SkillLine;

const RETENTION_THRESHOLD: f64 = 0.6;

/// Entities retained for the query, with their matched token positions keyed
/// by entity id.
pub struct EntitiesRetrieval<'a> {
    pub players: Vec<&'a Player>,
    pub monsters: Vec<&'a Monster>,
    pub items: Vec<&'a Item>,
    pub skills: Vec<SkillLine>,
    pub token_positions: TokenPositions,
}

fn retain(
    query_tokens: &[String],
    documents: &[String],
) -> Option<MatchedTokenPositions> {
    let (matched, score) = documents_score(query_tokens, documents);
    (score > RETENTION_THRESHOLD).then_some(matched)
}

pub fn entities_ir<'a>(
    query_tokens: &[String],
    players: &[&'a Player],
    monsters: &[&'a Monster],
    items: &[&'a Item],
    skills: &[SkillLine],
) -> EntitiesRetrieval<'a> {
    let mut token_positions = TokenPositions::new();

    let players = players
        .iter()
        .filter(|player| {
            let documents = vec![player.name.clone(), player.player.clone()];
            match retain(query_tokens, &documents) {
                Some(matched) => {
                    token_positions.insert(player.player.clone(), matched);
                    true
                }
                None => false,
            }
        })
        .copied()
        .collect();

    let monsters = monsters
        .iter()
        .filter(|monster| {
            let documents = vec![
                monster.beast.clone(),
                monster.name.clone(),
                monster.monster.clone(),
                monster
                    .monster
                    .strip_prefix("monster_")
                    .unwrap_or(&monster.monster)
                    .to_string(),
            ];
            match retain(query_tokens, &documents) {
                Some(matched) => {
                    token_positions.insert(monster.monster.clone(), matched);
                    true
                }
                None => false,
            }
        })
        .copied()
        .collect();

    let items = items
        .iter()
        .filter(|item| {
            let documents = vec![
                item.prop.clone(),
                item.name.clone(),
                item.item.clone(),
                item.item.strip_prefix("item_").unwrap_or(&item.item).to_string(),
            ];
            match retain(query_tokens, &documents) {
                Some(matched) => {
                    token_positions.insert(item.item.clone(), matched);
                    true
                }
                None => false,
            }
        })
        .copied()
        .collect();

    let skills = skills
        .iter()
        .filter(|skill| {
            let documents = vec![skill.id().to_string(), skill.name().to_string()];
            match retain(query_tokens, &documents) {
                Some(matched) => {
                    token_positions.insert(skill.id().to_string(), matched);
                    true
                }
                None => false,
            }
        })
        .copied()
        .collect();

    EntitiesRetrieval {
        players,
        monsters,
        items,
        skills,
        token_positions,
    }
}
