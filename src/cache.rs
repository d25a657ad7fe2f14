//! Size-bounded memoization of tessellation results.
//!
//! Entries are keyed by the shapes' structural hash plus every parameter that
//! affects the output, accounted by byte size, and evicted least recently used
//! first. Values are handed out as [`Arc`]s, so eviction never invalidates a
//! result a caller is still holding.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::mem::size_of_val;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::Result;
use crate::kernel::Kernel;
use crate::tessellation::{tessellate, MeshResult, TessellationParams};

/// Default cache budget: 128 MiB.
pub const DEFAULT_CAPACITY_BYTES: usize = 128 * 1024 * 1024;

/// Values that report their own accounted size for eviction.
pub trait CacheWeight {
    /// Accounted size in bytes.
    fn weight(&self) -> usize;
}

impl CacheWeight for MeshResult {
    fn weight(&self) -> usize {
        size_of_val(self.vertices.as_slice())
            + size_of_val(self.triangles.as_slice())
            + size_of_val(self.normals.as_slice())
            + size_of_val(self.edges.as_slice())
    }
}

/// Identity of a tessellation request.
///
/// Logging flags in [`TessellationParams`] are not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    shape_hash: u64,
    quality: u64,
    angular_tolerance: u64,
    compute_edges: bool,
    compute_faces: bool,
}

impl CacheKey {
    /// Builds the key for tessellating `shapes` with `params`.
    ///
    /// Every shape contributes its structural hash, in order.
    pub fn new<K: Kernel>(kernel: &K, shapes: &[K::Shape], params: &TessellationParams) -> Self {
        let shape_hash = match shapes {
            [single] => kernel.structural_hash(single),
            many => {
                let mut hasher = DefaultHasher::new();
                many.len().hash(&mut hasher);
                for shape in many {
                    kernel.structural_hash(shape).hash(&mut hasher);
                }
                hasher.finish()
            }
        };
        Self::from_parts(shape_hash, params)
    }

    /// Builds a key from a precomputed shape hash.
    #[must_use]
    pub fn from_parts(shape_hash: u64, params: &TessellationParams) -> Self {
        Self {
            shape_hash,
            quality: params.quality.to_bits(),
            angular_tolerance: params.angular_tolerance.to_bits(),
            compute_edges: params.compute_edges,
            compute_faces: params.compute_faces,
        }
    }

    /// The combined structural hash of the shapes.
    #[must_use]
    pub fn shape_hash(&self) -> u64 {
        self.shape_hash
    }
}

/// Cache construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total accounted size the cache may hold.
    pub capacity_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups that found an entry.
    pub hits: u64,
    /// Number of lookups that found nothing.
    pub misses: u64,
    /// Number of entries removed to make room.
    pub evictions: u64,
    /// Number of entries stored.
    pub inserted: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0.0 before any lookup.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Arc<MeshResult>,
    weight: usize,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    size_bytes: usize,
    clock: u64,
    stats: CacheStats,
}

impl CacheState {
    fn lookup(&mut self, key: &CacheKey) -> Option<Arc<MeshResult>> {
        self.clock += 1;
        let entry = self.entries.get_mut(key)?;
        entry.last_used = self.clock;
        Some(Arc::clone(&entry.value))
    }

    fn evict_lru(&mut self) -> bool {
        let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key)
        else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.size_bytes -= entry.weight;
            self.stats.evictions += 1;
        }
        true
    }
}

/// Thread-safe, byte-budgeted LRU cache of tessellation results.
///
/// Constructed once by the host application and shared by reference.
#[derive(Debug)]
pub struct TessellationCache {
    capacity_bytes: usize,
    state: Mutex<CacheState>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl Default for TessellationCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl TessellationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            capacity_bytes: config.capacity_bytes,
            state: Mutex::new(CacheState::default()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Tessellates `shapes`, reusing a cached result when the key matches.
    ///
    /// Concurrent callers asking for the same key wait for the first one
    /// instead of meshing again. Errors are returned as-is and never stored,
    /// so the next identical request meshes again.
    ///
    /// # Errors
    ///
    /// Returns any error from [`tessellate`].
    pub fn tessellate<K: Kernel>(
        &self,
        kernel: &mut K,
        shapes: &[K::Shape],
        params: &TessellationParams,
    ) -> Result<Arc<MeshResult>> {
        let key = CacheKey::new(kernel, shapes, params);
        if let Some(hit) = self.get(&key) {
            trace!(shape_hash = key.shape_hash, "tessellation cache hit");
            return Ok(hit);
        }

        let gate = Arc::clone(lock(&self.in_flight).entry(key).or_default());
        let _guard = lock(&gate);

        // Another caller may have finished while we waited.
        let waited = {
            let mut state = lock(&self.state);
            let found = state.lookup(&key);
            if found.is_some() {
                state.stats.misses = state.stats.misses.saturating_sub(1);
                state.stats.hits += 1;
            }
            found
        };
        let outcome = match waited {
            Some(hit) => Ok(hit),
            None => tessellate(kernel, shapes, params).map(|result| self.insert(key, result)),
        };
        self.release_gate(&key, &gate);
        outcome
    }

    /// Drops the in-flight entry for `key` if it is still `gate`.
    fn release_gate(&self, key: &CacheKey, gate: &Arc<Mutex<()>>) {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, gate)) {
            in_flight.remove(key);
        }
    }

    /// Looks up `key`, marking the entry as recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<MeshResult>> {
        let mut state = lock(&self.state);
        let found = state.lookup(key);
        if found.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        found
    }

    /// Stores `value` under `key` and returns the shared handle.
    ///
    /// An existing entry for `key` is kept unchanged and returned instead.
    /// A value heavier than the whole budget is returned without being stored.
    pub fn insert(&self, key: CacheKey, value: MeshResult) -> Arc<MeshResult> {
        let weight = value.weight();
        let mut state = lock(&self.state);
        if let Some(existing) = state.lookup(&key) {
            return existing;
        }

        let value = Arc::new(value);
        if weight > self.capacity_bytes {
            debug!(weight, capacity = self.capacity_bytes, "result exceeds cache budget, not stored");
            return value;
        }

        while state.size_bytes + weight > self.capacity_bytes {
            if !state.evict_lru() {
                break;
            }
        }

        let last_used = state.clock;
        state.entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                weight,
                last_used,
            },
        );
        state.size_bytes += weight;
        state.stats.inserted += 1;
        trace!(weight, size_bytes = state.size_bytes, "tessellation cached");
        value
    }

    /// Returns `true` if `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &CacheKey) -> bool {
        lock(&self.state).entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        lock(&self.state).entries.is_empty()
    }

    /// Total accounted size of the cached entries.
    pub fn size_bytes(&self) -> usize {
        lock(&self.state).size_bytes
    }

    /// The configured budget.
    #[must_use]
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.entries.clear();
        state.size_bytes = 0;
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        lock(&self.state).stats
    }
}

/// Locks `mutex`, recovering the data if another holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
