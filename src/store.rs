//! Pluggable parameter storage for trainable models.
//!
//! Model parameters in this framework are associative structures, not
//! fixed-size vectors. A small model keeps its maps fully in memory; a
//! model whose feature space outgrows memory runs the same code against
//! capacity-bounded maps with least-recently-used eviction. The choice is
//! a [`CapacityPolicy`], set per store with an optional per-map override,
//! and the training loop never branches on it.
//!
//! # Named maps and scratch lifecycle
//!
//! Every map is created under a name through a [`ParameterStore`], which
//! tracks the live names. Long-lived maps (the model's weights and
//! thresholds) stay registered for the model's lifetime. Scratch maps are
//! created at the start of a training iteration and disposed at its end,
//! accepted or not. Disposal is idempotent and never fails: dropping a
//! name that is already gone is logged and ignored.
//!
//! # Bounded mode is a memory knob, not a cache
//!
//! In bounded-LRU mode an insert beyond capacity evicts the least
//! recently accessed entry. Evicted entries are gone; the store does not
//! spill them anywhere. Callers are responsible for sizing the capacity
//! at or above the working set of one training iteration.

use std::collections::hash_map;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::{TrainResult, TrainingError};

/// Capacity policy for a named parameter map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityPolicy {
    /// Every entry is retained for the lifetime of the map.
    Unbounded,
    /// At most `capacity` entries are retained; inserting beyond that
    /// evicts the least-recently-accessed entry.
    BoundedLru {
        /// Maximum number of entries. Must be non-zero.
        capacity: usize,
    },
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::Unbounded
    }
}

/// Storage configuration handed to a model at construction time.
///
/// The policy applies to every map the model materializes through its
/// [`ParameterStore`], scratch maps included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Capacity policy for created maps.
    #[serde(default)]
    pub map_policy: CapacityPolicy,
}

/// An associative map of model parameters.
///
/// Both variants expose the same operations; only retention differs.
/// `peek` reads without touching LRU recency and is the right call on
/// shared read paths, while [`ParamMap::get`] promotes the entry in
/// bounded mode.
pub enum ParamMap<K: Eq + Hash, V> {
    /// HashMap-backed map retaining every entry.
    Unbounded(HashMap<K, V>),
    /// LRU-bounded map with a fixed maximum entry count.
    Bounded(LruCache<K, V>),
}

impl<K: Eq + Hash, V> ParamMap<K, V> {
    /// Builds an empty map under the given policy.
    ///
    /// A zero LRU capacity falls back to a capacity of one; going through
    /// [`ParameterStore::create`] instead reports that misconfiguration
    /// as an error.
    #[must_use]
    pub fn with_policy(policy: &CapacityPolicy) -> Self {
        match policy {
            CapacityPolicy::Unbounded => Self::Unbounded(HashMap::new()),
            CapacityPolicy::BoundedLru { capacity } => {
                let cap = NonZeroUsize::new(*capacity).unwrap_or(NonZeroUsize::MIN);
                Self::Bounded(LruCache::new(cap))
            }
        }
    }

    /// Inserts an entry, returning the previous value for the key.
    ///
    /// In bounded mode this may evict the least-recently-used entry.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        match self {
            Self::Unbounded(map) => map.insert(key, value),
            Self::Bounded(cache) => cache.put(key, value),
        }
    }

    /// Looks up an entry, promoting it to most-recently-used in bounded mode.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self {
            Self::Unbounded(map) => map.get(key),
            Self::Bounded(cache) => cache.get(key),
        }
    }

    /// Looks up an entry without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        match self {
            Self::Unbounded(map) => map.get(key),
            Self::Bounded(cache) => cache.peek(key),
        }
    }

    /// Removes an entry, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            Self::Unbounded(map) => map.remove(key),
            Self::Bounded(cache) => cache.pop(key),
        }
    }

    /// Returns whether the key is present.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        match self {
            Self::Unbounded(map) => map.contains_key(key),
            Self::Bounded(cache) => cache.contains(key),
        }
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unbounded(map) => map.len(),
            Self::Bounded(cache) => cache.len(),
        }
    }

    /// Returns whether the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        match self {
            Self::Unbounded(map) => map.clear(),
            Self::Bounded(cache) => cache.clear(),
        }
    }

    /// Iterates over retained entries.
    ///
    /// Iteration order is unspecified for unbounded maps and
    /// most-recent-first for bounded maps.
    pub fn iter(&self) -> ParamMapIter<'_, K, V> {
        match self {
            Self::Unbounded(map) => ParamMapIter::Unbounded(map.iter()),
            Self::Bounded(cache) => ParamMapIter::Bounded(cache.iter()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ParamMap<K, V> {
    /// Replaces this map's contents with a copy of `other`'s entries.
    pub fn copy_from(&mut self, other: &Self) {
        self.clear();
        for (key, value) in other.iter() {
            self.put(key.clone(), value.clone());
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for ParamMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded(map) => f
                .debug_struct("ParamMap::Unbounded")
                .field("len", &map.len())
                .finish(),
            Self::Bounded(cache) => f
                .debug_struct("ParamMap::Bounded")
                .field("len", &cache.len())
                .field("capacity", &cache.cap())
                .finish(),
        }
    }
}

/// Iterator over the entries of a [`ParamMap`].
pub enum ParamMapIter<'a, K: Eq + Hash, V> {
    /// Iterator over the unbounded variant.
    Unbounded(hash_map::Iter<'a, K, V>),
    /// Iterator over the bounded variant.
    Bounded(lru::Iter<'a, K, V>),
}

impl<'a, K: Eq + Hash, V> Iterator for ParamMapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Unbounded(iter) => iter.next(),
            Self::Bounded(iter) => iter.next(),
        }
    }
}

/// Factory and registry for named parameter maps.
///
/// A store's lifetime is independent of any training loop, and several
/// stores may coexist. The registry only tracks names: the maps
/// themselves are owned by the caller and handed back on disposal, which
/// keeps ownership explicit and makes scratch-map leaks observable
/// through [`ParameterStore::is_active`].
#[derive(Debug)]
pub struct ParameterStore {
    policy: CapacityPolicy,
    active: HashSet<String>,
}

impl ParameterStore {
    /// Creates a store that materializes maps under the configured policy.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self {
            policy: config.map_policy,
            active: HashSet::new(),
        }
    }

    /// Creates and registers a named map under the store's default
    /// policy.
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered or if a bounded policy
    /// carries a zero capacity. Creation failures are fatal to the caller:
    /// there is no fallback storage tier.
    pub fn create<K: Eq + Hash, V>(&mut self, name: &str) -> TrainResult<ParamMap<K, V>> {
        let policy = self.policy;
        self.create_with_policy(name, policy)
    }

    /// Creates and registers a named map under an explicit policy,
    /// overriding the store default for this map only.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`ParameterStore::create`].
    pub fn create_with_policy<K: Eq + Hash, V>(
        &mut self,
        name: &str,
        policy: CapacityPolicy,
    ) -> TrainResult<ParamMap<K, V>> {
        if let CapacityPolicy::BoundedLru { capacity: 0 } = policy {
            return Err(TrainingError::Store {
                name: name.to_string(),
                detail: "bounded-LRU capacity must be non-zero".to_string(),
            });
        }
        if !self.active.insert(name.to_string()) {
            return Err(TrainingError::Store {
                name: name.to_string(),
                detail: "a map with this name is already registered".to_string(),
            });
        }
        tracing::trace!(map = name, ?policy, "created parameter map");
        Ok(ParamMap::with_policy(&policy))
    }

    /// Disposes a named map, releasing its entries and deregistering the
    /// name.
    ///
    /// Safe to call for an empty map. Disposing a name that is no longer
    /// registered is logged at debug level and otherwise ignored; cleanup
    /// is best-effort and never propagates a failure.
    pub fn dispose<K: Eq + Hash, V>(&mut self, name: &str, map: ParamMap<K, V>) {
        drop(map);
        if self.active.remove(name) {
            tracing::trace!(map = name, "disposed parameter map");
        } else {
            tracing::debug!(map = name, "dispose of unregistered map ignored");
        }
    }

    /// Returns whether a named map is currently registered.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Number of currently registered maps.
    #[must_use]
    pub fn active_maps(&self) -> usize {
        self.active.len()
    }

    /// The capacity policy maps are created under.
    #[must_use]
    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }
}
