//! Bounded cache of rendered chunks.
//!
//! Chunks are pure functions of their coordinate and the world, so an
//! evicted chunk is simply rendered again when it is next needed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{render_chunk, ChunkCoord, TerrainChunk};
use crate::terrain::TerrainSource;

/// Chunks kept before eviction starts
pub const DEFAULT_CACHE_CAPACITY: usize = 80;

/// Which entry goes when the cache is full
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Oldest inserted first, hits do not count
    #[default]
    Fifo,
    /// Least recently requested first
    Lru,
}

impl EvictionPolicy {
    pub fn toggled(self) -> Self {
        match self {
            EvictionPolicy::Fifo => EvictionPolicy::Lru,
            EvictionPolicy::Lru => EvictionPolicy::Fifo,
        }
    }
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictionPolicy::Fifo => write!(f, "fifo"),
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    chunk: Arc<TerrainChunk>,
    stamp: u64,
}

/// Chunk cache keyed by chunk coordinate
pub struct ChunkCache {
    entries: HashMap<ChunkCoord, Entry>,
    /// Eviction order by stamp, lowest goes first
    order: BTreeMap<u64, ChunkCoord>,
    next_stamp: u64,
    capacity: usize,
    policy: EvictionPolicy,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY, EvictionPolicy::default())
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize, policy: EvictionPolicy) -> Self {
        let capacity = capacity.max(1);
        ChunkCache {
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            next_stamp: 0,
            capacity,
            policy,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Switch policy. Current entries keep their order.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        self.policy = policy;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, coord: &ChunkCoord) -> bool {
        self.entries.contains_key(coord)
    }

    /// Cached coordinates, next eviction first
    pub fn cached_coords(&self) -> Vec<ChunkCoord> {
        self.order.values().copied().collect()
    }

    /// Return the chunk at `coord`, rendering it on a miss.
    pub fn get_or_render(&mut self, coord: ChunkCoord, source: &TerrainSource<'_>) -> Arc<TerrainChunk> {
        if let Some(chunk) = self.entries.get(&coord).map(|e| Arc::clone(&e.chunk)) {
            self.hits += 1;
            if self.policy == EvictionPolicy::Lru {
                self.touch(coord);
            }
            return chunk;
        }

        self.misses += 1;
        debug!(x = coord.x, y = coord.y, "rendering chunk");
        let chunk = Arc::new(render_chunk(coord, source));
        self.insert(coord, Arc::clone(&chunk));
        chunk
    }

    /// Render every missing coordinate in parallel, then insert them in
    /// the given order. At most `capacity` chunks are rendered per call.
    /// Returns how many were rendered.
    pub fn prefetch(&mut self, coords: &[ChunkCoord], source: &TerrainSource<'_>) -> usize {
        let mut missing: Vec<ChunkCoord> = Vec::new();
        for coord in coords {
            if !self.entries.contains_key(coord) && !missing.contains(coord) {
                missing.push(*coord);
            }
        }
        missing.truncate(self.capacity);
        if missing.is_empty() {
            return 0;
        }

        let rendered: Vec<TerrainChunk> = missing
            .par_iter()
            .map(|&coord| render_chunk(coord, source))
            .collect();

        let count = rendered.len();
        self.misses += count as u64;
        for chunk in rendered {
            self.insert(chunk.coord, Arc::new(chunk));
        }
        debug!(count, len = self.entries.len(), "prefetched chunks");
        count
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            len: self.entries.len(),
            capacity: self.capacity,
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn insert(&mut self, coord: ChunkCoord, chunk: Arc<TerrainChunk>) {
        if self.entries.len() >= self.capacity {
            self.evict_one();
        }
        let stamp = self.bump();
        self.entries.insert(coord, Entry { chunk, stamp });
        self.order.insert(stamp, coord);
    }

    fn bump(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn evict_one(&mut self) {
        if let Some((_, oldest)) = self.order.pop_first() {
            self.entries.remove(&oldest);
            self.evictions += 1;
            debug!(x = oldest.x, y = oldest.y, policy = %self.policy, "evicted chunk");
        }
    }

    /// Move `coord` to the back of the eviction order in O(log n).
    fn touch(&mut self, coord: ChunkCoord) {
        let stamp = self.bump();
        if let Some(entry) = self.entries.get_mut(&coord) {
            self.order.remove(&entry.stamp);
            entry.stamp = stamp;
            self.order.insert(stamp, coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SpatialIndex;
    use crate::landmarks::{Landmark, LandmarkCategory, Point};
    use crate::terrain::TerrainParams;

    fn index() -> SpatialIndex {
        let landmarks = vec![Landmark::new("camp", 8.0, 8.0, LandmarkCategory::Base)];
        SpatialIndex::new(Point::new(8.0, 8.0), &landmarks, &[])
    }

    fn c(x: i32, y: i32) -> ChunkCoord {
        ChunkCoord::new(x, y)
    }

    #[test]
    fn test_same_chunk_twice_is_identical_and_hits() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(42, &index, &params);
        let mut cache = ChunkCache::new();

        let first = cache.get_or_render(c(0, 0), &source);
        let second = cache.get_or_render(c(0, 0), &source);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.pixels(), second.pixels());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_bound_never_exceeded() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(1, &index, &params);
        let mut cache = ChunkCache::with_capacity(6, EvictionPolicy::Fifo);

        for i in 0..20 {
            cache.get_or_render(c(i, -i), &source);
            assert!(cache.len() <= 6);
        }
        let stats = cache.stats();
        assert_eq!(stats.len, 6);
        assert_eq!(stats.evictions, 14);
    }

    #[test]
    fn test_evicted_chunk_renders_identically() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(42, &index, &params);
        let mut cache = ChunkCache::with_capacity(1, EvictionPolicy::Fifo);

        let first = cache.get_or_render(c(0, 0), &source);
        cache.get_or_render(c(1, 0), &source);
        assert!(!cache.contains(&c(0, 0)));
        let again = cache.get_or_render(c(0, 0), &source);
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn test_fifo_ignores_hits() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(3, &index, &params);
        let mut cache = ChunkCache::with_capacity(2, EvictionPolicy::Fifo);

        cache.get_or_render(c(0, 0), &source);
        cache.get_or_render(c(1, 0), &source);
        cache.get_or_render(c(0, 0), &source);
        cache.get_or_render(c(2, 0), &source);

        assert!(!cache.contains(&c(0, 0)));
        assert_eq!(cache.cached_coords(), vec![c(1, 0), c(2, 0)]);
    }

    #[test]
    fn test_lru_keeps_recent_hits() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(3, &index, &params);
        let mut cache = ChunkCache::with_capacity(2, EvictionPolicy::Lru);

        cache.get_or_render(c(0, 0), &source);
        cache.get_or_render(c(1, 0), &source);
        cache.get_or_render(c(0, 0), &source);
        cache.get_or_render(c(2, 0), &source);

        assert!(cache.contains(&c(0, 0)));
        assert!(!cache.contains(&c(1, 0)));
        assert_eq!(cache.cached_coords(), vec![c(0, 0), c(2, 0)]);
    }

    #[test]
    fn test_lru_order_after_many_hits() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(5, &index, &params);
        let mut cache = ChunkCache::with_capacity(8, EvictionPolicy::Lru);

        for i in 0..8 {
            cache.get_or_render(c(i, 0), &source);
        }
        // hit the even chunks repeatedly, newest last
        for _ in 0..3 {
            for i in (0..8).step_by(2) {
                cache.get_or_render(c(i, 0), &source);
            }
        }
        assert_eq!(cache.stats().hits, 12);
        assert_eq!(
            cache.cached_coords(),
            vec![c(1, 0), c(3, 0), c(5, 0), c(7, 0), c(0, 0), c(2, 0), c(4, 0), c(6, 0)]
        );

        for i in 8..12 {
            cache.get_or_render(c(i, 0), &source);
        }
        for i in (1..8).step_by(2) {
            assert!(!cache.contains(&c(i, 0)));
        }
        for i in (0..8).step_by(2) {
            assert!(cache.contains(&c(i, 0)));
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_prefetch_matches_serial_render() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(9, &index, &params);
        let mut cache = ChunkCache::with_capacity(16, EvictionPolicy::Fifo);

        let coords: Vec<ChunkCoord> = (-1..=1).flat_map(|y| (-1..=1).map(move |x| c(x, y))).collect();
        assert_eq!(cache.prefetch(&coords, &source), 9);
        assert_eq!(cache.prefetch(&coords, &source), 0);
        assert_eq!(cache.cached_coords(), coords);

        let serial = render_chunk(c(1, -1), &source);
        assert_eq!(*cache.get_or_render(c(1, -1), &source), serial);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_prefetch_respects_capacity() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(9, &index, &params);
        let mut cache = ChunkCache::with_capacity(3, EvictionPolicy::Fifo);
        cache.get_or_render(c(10, 10), &source);

        let coords = [c(0, 0), c(1, 0), c(0, 0), c(2, 0), c(3, 0), c(4, 0)];
        let rendered = cache.prefetch(&coords, &source);
        assert_eq!(rendered, 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.cached_coords(), vec![c(0, 0), c(1, 0), c(2, 0)]);
    }

    #[test]
    fn test_clear_and_zero_capacity() {
        let index = index();
        let params = TerrainParams::default();
        let source = TerrainSource::new(0, &index, &params);
        let mut cache = ChunkCache::with_capacity(0, EvictionPolicy::Lru);
        assert_eq!(cache.capacity(), 1);

        cache.get_or_render(c(0, 0), &source);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_policy_serde_and_toggle() {
        assert_eq!(serde_json::to_string(&EvictionPolicy::Lru).unwrap(), "\"lru\"");
        let parsed: EvictionPolicy = serde_json::from_str("\"fifo\"").unwrap();
        assert_eq!(parsed, EvictionPolicy::Fifo);
        assert_eq!(EvictionPolicy::Fifo.toggled(), EvictionPolicy::Lru);
        assert_eq!(EvictionPolicy::Lru.to_string(), "lru");
    }
}
