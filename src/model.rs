//! Learned model state for ordinal regression.
//!
//! [`OrdinalModelParameters`] holds everything a converged model needs to
//! score new records: one shared weight per feature and one decision
//! threshold per class along the latent regression line. Which named maps
//! a model owns is declared up front in a [`ParameterManifest`] handed to
//! the storage layer at materialization time, so the persistence boundary
//! is static and inspectable rather than discovered at runtime.
//!
//! # Invariants
//!
//! - `classes` is kept in ascending order; that order *is* the ordinal
//!   ranking and is semantically significant.
//! - Every class has an entry in `thresholds`.
//! - Thresholds visited in ascending class order are non-decreasing, and
//!   the maximal class's threshold is pinned to `+∞`, the open upper
//!   boundary of the ordinal line.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::error::TrainResult;
use crate::store::{ParamMap, ParameterStore};

/// Name of the per-feature weight map.
pub const WEIGHTS_MAP: &str = "weights";

/// Name of the per-class threshold map.
pub const THRESHOLDS_MAP: &str = "thresholds";

/// Static declaration of the named maps a model owns.
///
/// Passed once to the storage layer when the model materializes its
/// state; the same list drives disposal and checkpoint capture.
#[derive(Debug, Clone, Copy)]
pub struct ParameterManifest {
    /// Names of the maps, in materialization order.
    pub maps: &'static [&'static str],
}

/// The manifest for ordinal regression: a weight map and a threshold map.
pub const ORDINAL_MANIFEST: ParameterManifest = ParameterManifest {
    maps: &[WEIGHTS_MAP, THRESHOLDS_MAP],
};

/// Learned state of one trained ordinal regression model.
///
/// Created empty at training start, populated once per feature and class
/// seen in the data, mutated in place on every accepted iteration, and
/// treated as read-only once training returns.
#[derive(Debug)]
pub struct OrdinalModelParameters<K: Eq + Hash, C: Ord + Hash> {
    weights: ParamMap<K, f64>,
    thresholds: ParamMap<C, f64>,
    classes: BTreeSet<C>,
    sample_count: usize,
    feature_count: usize,
    class_count: usize,
}

impl<K, C> OrdinalModelParameters<K, C>
where
    K: Eq + Hash,
    C: Ord + Hash + Clone,
{
    /// Materializes empty parameter maps through the store, registering
    /// every name in [`ORDINAL_MANIFEST`].
    ///
    /// # Errors
    ///
    /// Fails if any manifest name is already registered in the store or
    /// the store cannot allocate a map.
    pub fn materialize(store: &mut ParameterStore) -> TrainResult<Self> {
        let weights = store.create(WEIGHTS_MAP)?;
        let thresholds = store.create(THRESHOLDS_MAP)?;
        Ok(Self {
            weights,
            thresholds,
            classes: BTreeSet::new(),
            sample_count: 0,
            feature_count: 0,
            class_count: 0,
        })
    }

    /// Disposes the model's maps through the store, consuming the model.
    pub fn dispose_into(self, store: &mut ParameterStore) {
        store.dispose(WEIGHTS_MAP, self.weights);
        store.dispose(THRESHOLDS_MAP, self.thresholds);
    }

    /// The manifest describing the maps this model owns.
    #[must_use]
    pub fn manifest() -> ParameterManifest {
        ORDINAL_MANIFEST
    }

    /// The per-feature weight map.
    #[must_use]
    pub fn weights(&self) -> &ParamMap<K, f64> {
        &self.weights
    }

    pub(crate) fn weights_mut(&mut self) -> &mut ParamMap<K, f64> {
        &mut self.weights
    }

    /// The per-class threshold map.
    ///
    /// Thresholds are the right-side class boundaries on the ordinal
    /// line; the maximal class maps to `+∞`.
    #[must_use]
    pub fn thresholds(&self) -> &ParamMap<C, f64> {
        &self.thresholds
    }

    pub(crate) fn thresholds_mut(&mut self) -> &mut ParamMap<C, f64> {
        &mut self.thresholds
    }

    /// The classes in ascending ordinal order.
    #[must_use]
    pub fn classes(&self) -> &BTreeSet<C> {
        &self.classes
    }

    pub(crate) fn set_classes(&mut self, classes: BTreeSet<C>) {
        self.class_count = classes.len();
        self.classes = classes;
    }

    /// Number of training records the model was fitted on.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub(crate) fn set_sample_count(&mut self, n: usize) {
        self.sample_count = n;
    }

    /// Number of distinct features seen during training.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub(crate) fn set_feature_count(&mut self, d: usize) {
        self.feature_count = d;
    }

    /// Number of distinct classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Maps each class to its immediate ordinal predecessor.
    ///
    /// The first class maps to `None`: its left boundary is the open
    /// lower end of the ordinal line. The adjacency never changes during
    /// a run, so the engines build this once and reuse it.
    #[must_use]
    pub fn previous_class_map(&self) -> HashMap<C, Option<C>> {
        let mut mapping = HashMap::with_capacity(self.classes.len());
        let mut previous: Option<C> = None;
        for class in &self.classes {
            mapping.insert(class.clone(), previous.clone());
            previous = Some(class.clone());
        }
        mapping
    }
}
