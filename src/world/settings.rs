//! World constants. All busy, cooldown and motion windows are tick multiples.

pub const MS_PER_TICK: u64 = 500;
pub const TICKS_PER_TURN: u32 = 4;
pub const MS_PER_TURN: u64 = MS_PER_TICK * TICKS_PER_TURN as u64;

/// Instance id of the shared overworld. Item interiors use the item id.
pub const LOCATION_INSTANCE: &str = "@";

pub const LOOK_PAGE_SIZE: usize = 20;

/// Chebyshev radius for event broadcast addressee sets.
pub const EVENT_RANGE: i32 = 8;

pub const MAX_PATH_ITERATIONS: u32 = 1000;

/// Traversal costs at or above this are never expanded by the pathfinder.
pub const IMPASSABLE: u32 = 1_000_000;

/// Turns a dead player stays busy after respawning.
pub const RESPAWN_BUSY_TURNS: u64 = 10;
