use std::path::Path;

use serde::Deserialize;

use crate::world::settings::{
    EVENT_RANGE, LOOK_PAGE_SIZE, MAX_PATH_ITERATIONS, MS_PER_TICK,
};

/// Tunables of the simulation core. Every field falls back to the world
/// constants, so an empty config file is valid.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub ms_per_tick: u64,
    pub look_page_size: usize,
    pub event_range: i32,
    pub max_path_iterations: u32,
    pub traversal_cache_size: usize,
    pub rng_seed: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            ms_per_tick: MS_PER_TICK,
            look_page_size: LOOK_PAGE_SIZE,
            event_range: EVENT_RANGE,
            max_path_iterations: MAX_PATH_ITERATIONS,
            traversal_cache_size: 4096,
            rng_seed: 0,
        }
    }
}

impl CoreConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, String> {
        serde_yaml::from_str(raw).map_err(|err| format!("config parse failed: {}", err))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| format!("config read {} failed: {}", path.display(), err))?;
        Self::from_yaml_str(&raw)
    }
}
