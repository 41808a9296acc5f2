//! Simulation core of a free-text, grid-based multiplayer dungeon. Commands
//! arrive as natural language, are bound to entities and verbs by the ir
//! layer, and are executed deterministically by the engine, which returns
//! typed events addressed to the players who should see them.

pub mod config;
pub mod engine;
pub mod entities;
pub mod events;
pub mod ir;
pub mod persistence;
pub mod telemetry;
pub mod world;

pub use config::CoreConfig;
pub use engine::{CommandOutcome, CommandRejection, ExecutionEngine, QuestTrigger};
pub use events::{AddressedEvent, GameEvent};
pub use ir::{search_possible_commands, GameCommand, SearchArgs, SearchResult};
