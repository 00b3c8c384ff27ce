//! Checkpoint save/restore for trained model parameters.
//!
//! A checkpoint is the logical persisted layout of one trained model:
//! the two named maps from the model's manifest (`weights` and
//! `thresholds`) plus the scalar counts. Encoding is `bincode`, which
//! preserves every `f64` bit-for-bit, so a stored model reloads with
//! parameters identical to the ones that were trained; prediction before
//! and after a round-trip matches exactly. The threshold pinned at `+∞`
//! survives the trip like any other value.
//!
//! Checkpoints carry a format version and are rejected on mismatch
//! rather than reinterpreted.

use std::collections::BTreeSet;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{TrainResult, TrainingError};
use crate::model::OrdinalModelParameters;
use crate::store::ParameterStore;

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one trained model's parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCheckpoint<K, C> {
    /// Checkpoint format version, for compatibility checking on load.
    pub version: u32,

    /// Number of training records the model was fitted on.
    pub sample_count: usize,

    /// Number of distinct features seen during training.
    pub feature_count: usize,

    /// Number of distinct classes.
    pub class_count: usize,

    /// Classes in ascending ordinal order.
    pub classes: Vec<C>,

    /// The per-feature weight map, entry order unspecified.
    pub weights: Vec<(K, f64)>,

    /// The per-class threshold map, in ascending class order.
    pub thresholds: Vec<(C, f64)>,
}

impl<K, C> ModelCheckpoint<K, C>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    C: Ord + Hash + Clone + Serialize + DeserializeOwned,
{
    /// Captures a snapshot of the given parameters.
    #[must_use]
    pub fn capture(params: &OrdinalModelParameters<K, C>) -> Self {
        let classes: Vec<C> = params.classes().iter().cloned().collect();
        let weights: Vec<(K, f64)> = params
            .weights()
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        let thresholds: Vec<(C, f64)> = classes
            .iter()
            .map(|c| {
                let theta = params.thresholds().peek(c).copied().unwrap_or(f64::INFINITY);
                (c.clone(), theta)
            })
            .collect();

        Self {
            version: CHECKPOINT_VERSION,
            sample_count: params.sample_count(),
            feature_count: params.feature_count(),
            class_count: params.class_count(),
            classes,
            weights,
            thresholds,
        }
    }

    /// Writes the checkpoint to a file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if the file cannot be
    /// created or serialization fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TrainResult<()> {
        let file = File::create(path.as_ref()).map_err(|e| TrainingError::Checkpoint {
            reason: format!("failed to create checkpoint file: {e}"),
        })?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self).map_err(|e| TrainingError::Checkpoint {
            reason: format!("failed to serialize checkpoint: {e}"),
        })
    }

    /// Reads a checkpoint from a file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if the file cannot be read,
    /// deserialization fails, or the format version does not match.
    pub fn load<P: AsRef<Path>>(path: P) -> TrainResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| TrainingError::Checkpoint {
            reason: format!("failed to open checkpoint file: {e}"),
        })?;
        let reader = BufReader::new(file);
        let checkpoint: Self =
            bincode::deserialize_from(reader).map_err(|e| TrainingError::Checkpoint {
                reason: format!("failed to deserialize checkpoint: {e}"),
            })?;

        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(TrainingError::Checkpoint {
                reason: format!(
                    "unsupported checkpoint version {} (expected {})",
                    checkpoint.version, CHECKPOINT_VERSION
                ),
            });
        }
        Ok(checkpoint)
    }

    /// Rebuilds model parameters from this snapshot, materializing the
    /// maps through the given store.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if the snapshot is
    /// internally inconsistent, or a store error if the manifest maps
    /// cannot be created.
    pub fn restore(
        self,
        store: &mut ParameterStore,
    ) -> TrainResult<OrdinalModelParameters<K, C>> {
        if self.class_count != self.classes.len() {
            return Err(TrainingError::Checkpoint {
                reason: format!(
                    "class count {} does not match {} stored classes",
                    self.class_count,
                    self.classes.len()
                ),
            });
        }

        let mut params = OrdinalModelParameters::materialize(store)?;
        params.set_sample_count(self.sample_count);
        params.set_feature_count(self.feature_count);
        params.set_classes(self.classes.into_iter().collect::<BTreeSet<C>>());

        for (key, value) in self.weights {
            params.weights_mut().put(key, value);
        }
        for (class, theta) in self.thresholds {
            params.thresholds_mut().put(class, theta);
        }
        Ok(params)
    }
}
