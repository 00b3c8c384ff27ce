//! # ordinal-trainer-rs
//!
//! Training framework for statistical models whose parameters are large
//! associative structures (feature → weight, class → threshold) rather
//! than fixed-size vectors, exemplified by an ordinal regression
//! classifier trained with full-batch gradient descent and a bold-driver
//! adaptive step size.
//!
//! ## Overview
//!
//! Three pieces cooperate:
//!
//! 1. **Pluggable parameter storage** — model parameters live in named
//!    maps created through a [`store::ParameterStore`]. A small model
//!    keeps everything in memory; a model whose feature space is too
//!    large runs unchanged against capacity-bounded LRU maps. Scratch
//!    maps for each training iteration go through the same lifecycle and
//!    are disposed unconditionally when the iteration ends.
//! 2. **The optimization engine** — [`trainer::OrdinalRegression`] runs a
//!    fixed-length loop of full-batch gradient iterations with
//!    simultaneous-update semantics, saturation-guarded transcendentals,
//!    and bold-driver acceptance: cost went up → halve the rate and
//!    discard the candidate; otherwise keep it and grow the rate.
//! 3. **Prediction and validation** — converged thresholds partition the
//!    latent line into per-class probability mass; validation reports
//!    accuracy, mean cost, and the count-based pseudo-R².
//!
//! ## Quick Start
//!
//! ```rust
//! use ordinal_trainer_rs::prelude::*;
//! use std::collections::HashMap;
//!
//! let mut data: Dataset<&str, u8> = Dataset::new();
//! for (size, rating) in [(1.0, 0u8), (1.5, 0), (6.0, 1), (6.5, 1)] {
//!     let features: HashMap<&str, f64> = [("size", size)].into_iter().collect();
//!     data.push(Record::labeled(features, rating));
//! }
//!
//! let mut model = OrdinalRegression::new(StorageConfig::default());
//! model.train(&data, &OrdinalTrainingConfig::default())?;
//!
//! model.predict(&mut data)?;
//! let metrics = model.validate(&mut data)?;
//! assert!(metrics.accuracy > 0.0);
//! # Ok::<(), ordinal_trainer_rs::TrainingError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Training configuration and TOML serialization
//! - [`error`] - Error types for configuration, data, store, and
//!   checkpoint failures
//! - [`store`] - Named parameter maps with unbounded and bounded-LRU
//!   capacity policies
//! - [`dataset`] - Record and dataset collaborator types
//! - [`model`] - Learned parameters and the storage manifest
//! - [`numeric`] - Saturated sigmoid, saturated log-logistic loss,
//!   sparse dot product
//! - [`trainer`] - The batch gradient / bold-driver training engine
//! - [`predictor`] - Class probability partition and label selection
//! - [`metrics`] - Validation metrics and per-iteration telemetry
//! - [`checkpoint`] - Versioned parameter persistence
//!
//! ## Concurrency
//!
//! One training run is a single logical thread of control. Parameter
//! maps are exclusively owned by one model instance; nothing here is
//! internally synchronized, and two runs must not share a store-backed
//! map without external coordination.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
// Precision-loss casts are routine in numeric averaging code.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod checkpoint;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod numeric;
pub mod predictor;
pub mod store;
pub mod trainer;

pub use checkpoint::{ModelCheckpoint, CHECKPOINT_VERSION};
pub use config::OrdinalTrainingConfig;
pub use dataset::{Dataset, Record};
pub use error::{TrainResult, TrainingError};
pub use metrics::{IterationMetrics, TrainingReport, ValidationMetrics};
pub use model::{OrdinalModelParameters, ParameterManifest, ORDINAL_MANIFEST};
pub use store::{CapacityPolicy, ParamMap, ParameterStore, StorageConfig};
pub use trainer::OrdinalRegression;

use std::hash::Hash;

/// A model that can be fitted, applied, and scored.
///
/// This is the explicit seam between algorithm families: each concrete
/// algorithm pairs its own configuration and metrics types with the
/// three lifecycle operations. Parameter materialization is an
/// implementation detail of the concrete type, declared through its
/// storage manifest rather than discovered at runtime.
///
/// # Type Parameters
///
/// - `K`: feature key, any hashable identifier
/// - `C`: class label; its total order is the ordinal ranking
pub trait TrainableModel<K, C>
where
    K: Eq + Hash,
    C: Ord + Hash,
{
    /// Configuration consumed by one training run.
    type Config;

    /// Quality measures produced by validation.
    type Metrics;

    /// Fits the model on a dataset, mutating internal parameters.
    fn train(&mut self, data: &Dataset<K, C>, config: &Self::Config) -> TrainResult<()>;

    /// Annotates records with predicted labels and per-class
    /// probabilities.
    fn predict(&self, data: &mut Dataset<K, C>) -> TrainResult<()>;

    /// Scores the model against held-out data.
    fn validate(&self, data: &mut Dataset<K, C>) -> TrainResult<Self::Metrics>;
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use ordinal_trainer_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CapacityPolicy, Dataset, OrdinalRegression, OrdinalTrainingConfig, Record, StorageConfig,
        TrainResult, TrainableModel, TrainingError, ValidationMetrics,
    };
}
