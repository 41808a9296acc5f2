//! Free-text command interpretation: tokenize the query, retrieve candidate
//! entities and verbs, then bind them into ranked, executable commands.

pub mod commands;
pub mod entities;
pub mod tokenize;
pub mod vocab;

pub use commands::{
    search_possible_commands, CommandEntities, CommandVariables, CommandVerb, GameCommand, Offer,
    SearchArgs, SearchResult,
};
pub use tokenize::{fuzzy_match, tokenize as tokenize_query, FuzzyScore, TokenPositions};
