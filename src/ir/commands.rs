//! Constraint-based command building. Retrieval proposes entities and verbs;
//! this module binds them into concrete commands using each verb's predicate,
//! scores the candidates and ranks them. The engine receives entity ids, not
//! borrowed state; it re-fetches everything at execution time.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::{EntityKind, Item, Monster, Player};
use crate::ir::entities::entities_ir;
use crate::ir::tokenize::{tokenize, TokenPositions};
use crate::ir::vocab::{game_actions_ir, utility_key};
use crate::world::abilities::{find_ability, Ability};
use crate::world::actions::{Action, ActionKind, TokenRole};
use crate::world::compendium::{Compendium, Utility};
use crate::world::skills::{CurrencyKind, SkillLine};

/// What a command asks the engine to do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandVerb {
    Action(ActionKind),
    Ability(String),
    Utility { item: String, utility: String },
}

impl CommandVerb {
    /// Key into the token positions this verb was retrieved under.
    pub fn key(&self) -> String {
        match self {
            CommandVerb::Action(kind) => kind.id().to_string(),
            CommandVerb::Ability(name) => name.clone(),
            CommandVerb::Utility { item, utility } => utility_key(item, utility),
        }
    }
}

/// One side of a barter: specific items, prop kinds and currency amounts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offer {
    pub items: Vec<String>,
    pub props: Vec<String>,
    pub lum: i64,
    pub umb: i64,
}

/// Parse one query token as a barter list, eg. `100lum,2sticks` fails but
/// `100lum,item_stick_1,woodenclub` parses.
pub fn parse_offer(token: &str, compendium: &Compendium) -> Option<Offer> {
    let mut offer = Offer::default();
    let mut ok = false;
    'parts: for part in token.split(',') {
        for kind in [CurrencyKind::Lum, CurrencyKind::Umb] {
            if let Some(amount) = part.strip_suffix(kind.id()) {
                if let Ok(amount) = amount.parse::<i64>() {
                    match kind {
                        CurrencyKind::Lum => offer.lum = amount,
                        CurrencyKind::Umb => offer.umb = amount,
                    }
                    ok = true;
                    continue 'parts;
                }
            }
        }
        if part.starts_with("item") {
            offer.items.push(part.to_string());
            ok = true;
        } else if compendium.contains(part) {
            offer.props.push(part.to_string());
            ok = true;
        }
    }
    ok.then_some(offer)
}

/// Entity ids bound to a command's predicate slots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandEntities {
    pub self_id: String,
    pub target: Option<String>,
    pub item: Option<String>,
    pub offer: Option<Offer>,
    pub receive: Option<Offer>,
}

/// The query split into the part the command consumed and the free text left
/// over, eg. the words actually said for `say`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandVariables {
    pub query: String,
    pub query_irrelevant: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameCommand {
    pub verb: CommandVerb,
    pub entities: CommandEntities,
    pub variables: Option<CommandVariables>,
}

pub struct SearchArgs<'a> {
    pub query: &'a str,
    pub player: &'a Player,
    pub player_abilities: &'a [Ability],
    pub player_items: Vec<&'a Item>,
    /// Caller-filtered pools; only what the player can currently perceive.
    pub monsters: Vec<&'a Monster>,
    pub players: Vec<&'a Player>,
    pub items: Vec<&'a Item>,
    pub skills: &'a [SkillLine],
    pub actions: &'a [Action],
    pub compendium: &'a Compendium,
    /// Full registry, for abilities referenced by item utilities.
    pub ability_registry: &'a [Ability],
}

pub struct SearchResult {
    /// Ranked best-first; if the best is a perfect match, only perfect
    /// matches remain.
    pub commands: Vec<GameCommand>,
    pub query_tokens: Vec<String>,
    pub token_positions: TokenPositions,
}

pub fn search_possible_commands(args: &SearchArgs) -> SearchResult {
    let query_tokens = tokenize(args.query);

    let mut players: Vec<&Player> = args.players.clone();
    players.push(args.player);
    let mut items: Vec<&Item> = args.player_items.clone();
    items.extend(args.items.iter().copied());

    let retrieved = entities_ir(
        &query_tokens,
        &players,
        &args.monsters,
        &items,
        args.skills,
    );

    let item_utilities: Vec<(&Item, &Utility)> = items
        .iter()
        .flat_map(|item| {
            args.compendium
                .get(&item.prop)
                .map(|prop| prop.utilities.iter().map(move |utility| (*item, utility)))
                .into_iter()
                .flatten()
        })
        .collect();

    let vocab = game_actions_ir(
        &query_tokens,
        args.player_abilities,
        &item_utilities,
        args.actions,
    );

    let mut token_positions = retrieved.token_positions.clone();
    token_positions.extend(vocab.token_positions.clone());

    let mut commands: Vec<GameCommand> = Vec::new();

    for ability in &vocab.abilities {
        for entities in resolve_ability_entities(
            ability,
            args.player,
            &token_positions,
            &retrieved.monsters,
            &retrieved.players,
            &retrieved.items,
        ) {
            commands.push(GameCommand {
                verb: CommandVerb::Ability(ability.ability.clone()),
                entities,
                variables: None,
            });
        }
    }

    for (item, utility) in &vocab.item_utilities {
        let verb = CommandVerb::Utility {
            item: item.item.clone(),
            utility: utility.utility.clone(),
        };
        match utility
            .ability
            .as_deref()
            .and_then(|name| find_ability(args.ability_registry, name))
        {
            Some(ability) => {
                for mut entities in resolve_ability_entities(
                    ability,
                    args.player,
                    &token_positions,
                    &retrieved.monsters,
                    &retrieved.players,
                    &retrieved.items,
                ) {
                    entities.item = Some(item.item.clone());
                    commands.push(GameCommand {
                        verb: verb.clone(),
                        entities,
                        variables: None,
                    });
                }
            }
            // Utilities without an ability act on the item itself.
            None => commands.push(GameCommand {
                verb: verb.clone(),
                entities: CommandEntities {
                    self_id: args.player.player.clone(),
                    item: Some(item.item.clone()),
                    ..CommandEntities::default()
                },
                variables: None,
            }),
        }
    }

    for action in &vocab.actions {
        for entities in resolve_action_entities(
            action,
            args.player,
            &query_tokens,
            &token_positions,
            &retrieved.monsters,
            &retrieved.players,
            &retrieved.items,
            args.compendium,
        ) {
            let variables = command_variables(action, &query_tokens, &token_positions);
            commands.push(GameCommand {
                verb: CommandVerb::Action(action.action),
                entities,
                variables: Some(variables),
            });
        }
    }

    let mut scored: Vec<(f64, GameCommand)> = commands
        .into_iter()
        .map(|command| {
            let score = game_command_score(&command, &token_positions, &query_tokens);
            (score, command)
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    if scored.first().is_some_and(|(score, _)| *score >= 1.0) {
        scored.retain(|(score, _)| *score >= 1.0);
    }

    SearchResult {
        commands: scored.into_iter().map(|(_, command)| command).collect(),
        query_tokens,
        token_positions,
    }
}

/// Bind an ability's targeting predicate against the retrieved pools. Every
/// retained candidate of an allowed target type becomes one binding, scored
/// by its best matched token.
pub fn resolve_ability_entities(
    ability: &Ability,
    player: &Player,
    token_positions: &TokenPositions,
    monsters: &[&Monster],
    players: &[&Player],
    items: &[&Item],
) -> Vec<CommandEntities> {
    let predicate = &ability.predicate;
    if !predicate.self_types.contains(&EntityKind::Player) {
        return Vec::new();
    }

    let mut scored: Vec<(CommandEntities, f64)> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for kind in &predicate.target_types {
        let candidates: Vec<&str> = match kind {
            EntityKind::Monster => monsters.iter().map(|m| m.monster.as_str()).collect(),
            EntityKind::Player => players.iter().map(|p| p.player.as_str()).collect(),
            EntityKind::Item => items.iter().map(|i| i.item.as_str()).collect(),
        };
        for target_id in candidates {
            if !predicate.target_self_allowed && target_id == player.player {
                continue;
            }
            if !seen.insert(target_id.to_string()) {
                continue;
            }
            scored.push((
                CommandEntities {
                    self_id: player.player.clone(),
                    target: Some(target_id.to_string()),
                    ..CommandEntities::default()
                },
                highest_score_for_token(target_id, token_positions),
            ));
        }
    }

    // Self-only abilities bind without a target.
    if predicate.target_types.is_empty() {
        scored.push((
            CommandEntities {
                self_id: player.player.clone(),
                ..CommandEntities::default()
            },
            1.0,
        ));
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(entities, _)| entities).collect()
}

fn highest_score_for_token(entity_id: &str, token_positions: &TokenPositions) -> f64 {
    token_positions
        .get(entity_id)
        .map(|positions| {
            positions
                .values()
                .map(|matched| matched.score)
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0)
}

fn filter_creature_target(action: ActionKind, alive: bool) -> bool {
    action != ActionKind::Attack || alive
}

fn filter_item_target(action: ActionKind, player: &Player, item: &Item, compendium: &Compendium) -> bool {
    match action {
        ActionKind::Equip | ActionKind::Give | ActionKind::Drop => {
            item.in_inventory_of(&player.player)
        }
        ActionKind::Unequip => item.equipped_by(&player.player),
        ActionKind::Take => item.location.is_on_grid(),
        ActionKind::Enter => {
            item.location.is_on_grid()
                && compendium.get(&item.prop).is_some_and(|prop| prop.interior)
        }
        ActionKind::Attack => !item.is_destroyed(),
        _ => true,
    }
}

/// Bind an action's token predicate against the query. Word order matters:
/// each slot matches only at its declared position.
#[allow(clippy::too_many_arguments)]
pub fn resolve_action_entities(
    action: &Action,
    player: &Player,
    query_tokens: &[String],
    token_positions: &TokenPositions,
    monsters: &[&Monster],
    players: &[&Player],
    items: &[&Item],
    compendium: &Compendium,
) -> Vec<CommandEntities> {
    let mut offer: Option<Offer> = None;
    let mut receive: Option<Offer> = None;
    let mut item: Option<String> = None;

    // Non-target slots bind first; their bindings are shared by every
    // candidate target.
    for spec in &action.predicate.tokens {
        let token = query_tokens.get(spec.position);
        match spec.role {
            TokenRole::Action => {
                let bound = token_positions
                    .get(action.action.id())
                    .is_some_and(|positions| positions.contains_key(&spec.position));
                if !spec.optional && !bound {
                    return Vec::new();
                }
            }
            TokenRole::Offer => {
                offer = token.and_then(|t| parse_offer(t, compendium));
                if !spec.optional && offer.is_none() {
                    return Vec::new();
                }
            }
            TokenRole::Receive => {
                receive = token.and_then(|t| parse_offer(t, compendium));
                if !spec.optional && receive.is_none() {
                    return Vec::new();
                }
            }
            TokenRole::Item => {
                if let Some(token) = token {
                    for (entity_id, positions) in token_positions {
                        let matched_here = positions
                            .get(&spec.position)
                            .is_some_and(|matched| &matched.token == token);
                        if matched_here {
                            if let Some(found) = items.iter().find(|i| &i.item == entity_id) {
                                item = Some(found.item.clone());
                                break;
                            }
                        }
                    }
                }
                if !spec.optional && item.is_none() {
                    return Vec::new();
                }
            }
            TokenRole::Target => {}
        }
    }

    let mut scored: Vec<(CommandEntities, f64)> = Vec::new();
    for spec in &action.predicate.tokens {
        if spec.role != TokenRole::Target {
            continue;
        }
        for kind in &spec.entity_types {
            let candidates: Vec<&str> = match kind {
                EntityKind::Monster => monsters
                    .iter()
                    .filter(|m| filter_creature_target(action.action, m.is_alive()))
                    .map(|m| m.monster.as_str())
                    .collect(),
                EntityKind::Player => players
                    .iter()
                    .filter(|p| filter_creature_target(action.action, p.is_alive()))
                    .map(|p| p.player.as_str())
                    .collect(),
                EntityKind::Item => items
                    .iter()
                    .filter(|i| filter_item_target(action.action, player, i, compendium))
                    .map(|i| i.item.as_str())
                    .collect(),
            };
            for target_id in candidates {
                let matched = token_positions
                    .get(target_id)
                    .and_then(|positions| positions.get(&spec.position));
                if let Some(matched) = matched {
                    scored.push((
                        CommandEntities {
                            self_id: player.player.clone(),
                            target: Some(target_id.to_string()),
                            item: item.clone(),
                            offer: offer.clone(),
                            receive: receive.clone(),
                        },
                        matched.score,
                    ));
                }
            }
        }
        if !spec.optional && scored.is_empty() {
            return Vec::new();
        }
    }

    // No target bound but none required; the action acts on the actor.
    if scored.is_empty() {
        return vec![CommandEntities {
            self_id: player.player.clone(),
            target: None,
            item,
            offer,
            receive,
        }];
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(entities, _)| entities).collect()
}

/// Split the query into consumed and leftover text. A position is consumed
/// when the predicate requires it, or when it is optional but something
/// matched there.
pub fn command_variables(
    action: &Action,
    query_tokens: &[String],
    token_positions: &TokenPositions,
) -> CommandVariables {
    let mut relevant: BTreeSet<usize> = action
        .predicate
        .tokens
        .iter()
        .filter(|spec| !spec.optional)
        .map(|spec| spec.position)
        .collect();

    for spec in &action.predicate.tokens {
        let matched_anywhere = token_positions
            .values()
            .any(|positions| positions.contains_key(&spec.position));
        if matched_anywhere {
            relevant.insert(spec.position);
        }
    }

    let query_irrelevant = query_tokens
        .iter()
        .enumerate()
        .filter(|(position, _)| !relevant.contains(position))
        .map(|(_, token)| token.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    CommandVariables {
        query: query_tokens.join(" "),
        query_irrelevant,
    }
}

/// Mean matched score over the command's bound keys (verb, target, item),
/// normalized by query length. A command that consumes the whole query
/// scores 1.
pub fn game_command_score(
    command: &GameCommand,
    token_positions: &TokenPositions,
    query_tokens: &[String],
) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let mut keys = vec![command.verb.key()];
    if let Some(target) = &command.entities.target {
        keys.push(target.clone());
    }
    if let Some(item) = &command.entities.item {
        keys.push(item.clone());
    }
    let total: f64 = keys
        .iter()
        .filter_map(|key| token_positions.get(key))
        .filter_map(|positions| positions.values().next())
        .map(|matched| matched.score)
        .sum();
    total / query_tokens.len() as f64
}
