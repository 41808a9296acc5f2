use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::world::position::Cell;
use crate::world::settings::IMPASSABLE;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Grassland,
    Forest,
    Desert,
    Tundra,
    Water,
    Rock,
}

impl Biome {
    /// Movement speed factor; zero means the cell cannot be walked.
    pub fn traversable_speed(self) -> f64 {
        match self {
            Biome::Grassland => 1.0,
            Biome::Forest => 0.8,
            Biome::Desert => 1.0,
            Biome::Tundra => 0.7,
            Biome::Water => 0.0,
            Biome::Rock => 0.0,
        }
    }

    /// Base traversal cost for pathfinding.
    pub fn traversal_cost(self) -> u32 {
        if self.traversable_speed() <= 0.0 {
            IMPASSABLE
        } else {
            0
        }
    }
}

/// Supplies the biome for a cell in a location instance. The world map itself
/// lives outside this core.
pub trait Terrain {
    fn biome_at(&self, cell: Cell, instance: &str) -> Biome;
}

/// Single-biome terrain, the default for tests and interiors.
#[derive(Clone, Copy, Debug)]
pub struct UniformTerrain {
    pub biome: Biome,
}

impl Default for UniformTerrain {
    fn default() -> Self {
        UniformTerrain {
            biome: Biome::Grassland,
        }
    }
}

impl Terrain for UniformTerrain {
    fn biome_at(&self, _cell: Cell, _instance: &str) -> Biome {
        self.biome
    }
}

#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64)
        }
    }
}

/// Per-cell traversal cost cache with LRU eviction. Keyed by location
/// instance so interiors do not alias the overworld.
pub struct TraversalCache {
    cache: LruCache<(String, Cell), u32>,
    stats: CacheStats,
}

impl TraversalCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        TraversalCache {
            cache: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a cached cost, computing and inserting it on a miss.
    pub fn cost<F>(&mut self, instance: &str, cell: Cell, compute: F) -> u32
    where
        F: FnOnce() -> u32,
    {
        let key = (instance.to_string(), cell);
        if let Some(&cost) = self.cache.get(&key) {
            self.stats.hits += 1;
            return cost;
        }
        self.stats.misses += 1;
        let cost = compute();
        if self.cache.len() == self.cache.cap().get() {
            self.stats.evictions += 1;
        }
        self.cache.put(key, cost);
        cost
    }

    pub fn invalidate(&mut self, instance: &str, cell: Cell) {
        self.cache.pop(&(instance.to_string(), cell));
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
