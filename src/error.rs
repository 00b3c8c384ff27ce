//! Error types for model training, prediction, and persistence.
//!
//! Every failure in this crate is surfaced through [`TrainingError`]. The
//! optimization loop itself is deterministic, so no variant carries retry
//! semantics: a failed pass would fail identically if re-run. Numeric edge
//! cases (sigmoid saturation, unknown features at prediction time) are
//! absorbed by the algorithm and never reach this module.
//!
//! # Error Categories
//!
//! - **Configuration errors**: invalid iteration budget or learning rate,
//!   rejected before the first pass over the data
//! - **Data errors**: empty datasets or label sets that cannot support
//!   ordinal regression
//! - **Store errors**: failures allocating a named parameter map
//! - **Checkpoint errors**: save/load failures during persistence

use thiserror::Error;

/// The main error type for the training framework.
///
/// Each variant includes enough context to diagnose the failure without
/// re-running the pass that produced it.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Training configuration failed validation.
    ///
    /// Raised before any data is touched: a zero iteration budget or a
    /// non-finite/non-positive learning rate can never produce a model.
    #[error("invalid configuration: {detail}")]
    InvalidConfiguration {
        /// Description of the rejected parameter.
        detail: String,
    },

    /// The dataset cannot support the requested operation.
    ///
    /// An empty training or validation set carries no information to fit
    /// or score against.
    #[error("insufficient data: {detail}")]
    InsufficientData {
        /// Description of what was missing.
        detail: String,
    },

    /// The training data violates a structural requirement of the model.
    ///
    /// Ordinal regression needs at least two ordered classes, and every
    /// training record must carry a label.
    #[error("invalid training data: {detail}")]
    InvalidTraining {
        /// Description of the violation.
        detail: String,
    },

    /// A named parameter map could not be created.
    ///
    /// Store creation failures are fatal and abort training; there is no
    /// fallback storage tier.
    #[error("parameter store failure for map `{name}`: {detail}")]
    Store {
        /// Name of the map whose creation failed.
        name: String,
        /// Description of the failure.
        detail: String,
    },

    /// Prediction or validation was requested before training completed.
    #[error("model has not been trained")]
    ModelNotTrained,

    /// Checkpoint save or load failed.
    #[error("checkpoint error: {reason}")]
    Checkpoint {
        /// Description of the persistence failure.
        reason: String,
    },
}

/// Result type used throughout the crate.
pub type TrainResult<T> = Result<T, TrainingError>;
