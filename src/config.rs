//! Training configuration for the ordinal regression trainer.
//!
//! Configuration is immutable for the duration of a run: the engine
//! copies the learning rate into a local that the bold-driver rule
//! mutates, and the original value is not restored or written back.
//!
//! # Example
//!
//! ```rust
//! use ordinal_trainer_rs::config::OrdinalTrainingConfig;
//!
//! // Defaults match the classical setup: 100 iterations, rate 0.1.
//! let config = OrdinalTrainingConfig::default();
//!
//! // Builder pattern
//! let config = OrdinalTrainingConfig::builder()
//!     .total_iterations(250)
//!     .learning_rate(0.05)
//!     .build();
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TrainResult, TrainingError};

/// Configuration for one training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrdinalTrainingConfig {
    /// Iteration budget for the optimization loop.
    ///
    /// The loop always runs exactly this many full-batch iterations; the
    /// adaptive learning rate affects step size, never iteration count.
    #[serde(default = "default_total_iterations")]
    pub total_iterations: usize,

    /// Initial learning rate for the bold-driver schedule.
    ///
    /// Halved on every rejected candidate, multiplied by 1.05 on every
    /// accepted one. Must be positive and finite.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

fn default_total_iterations() -> usize {
    100
}
fn default_learning_rate() -> f64 {
    0.1
}

impl Default for OrdinalTrainingConfig {
    fn default() -> Self {
        Self {
            total_iterations: default_total_iterations(),
            learning_rate: default_learning_rate(),
        }
    }
}

impl OrdinalTrainingConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> OrdinalTrainingConfigBuilder {
        OrdinalTrainingConfigBuilder::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfiguration`] if the file cannot
    /// be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> TrainResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TrainingError::InvalidConfiguration {
                detail: format!("failed to read config file: {e}"),
            }
        })?;
        toml::from_str(&content).map_err(|e| TrainingError::InvalidConfiguration {
            detail: format!("failed to parse config: {e}"),
        })
    }

    /// Saves configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfiguration`] if serialization or
    /// writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> TrainResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TrainingError::InvalidConfiguration {
                detail: format!("failed to serialize config: {e}"),
            })?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            TrainingError::InvalidConfiguration {
                detail: format!("failed to write config file: {e}"),
            }
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfiguration`] for a zero
    /// iteration budget or a non-positive or non-finite learning rate.
    pub fn validate(&self) -> TrainResult<()> {
        if self.total_iterations == 0 {
            return Err(TrainingError::InvalidConfiguration {
                detail: "total_iterations must be > 0".to_string(),
            });
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(TrainingError::InvalidConfiguration {
                detail: format!(
                    "learning_rate must be positive and finite, got {}",
                    self.learning_rate
                ),
            });
        }
        Ok(())
    }
}

/// Builder for [`OrdinalTrainingConfig`].
#[derive(Debug, Default)]
pub struct OrdinalTrainingConfigBuilder {
    total_iterations: Option<usize>,
    learning_rate: Option<f64>,
}

impl OrdinalTrainingConfigBuilder {
    /// Sets the iteration budget.
    #[must_use]
    pub fn total_iterations(mut self, total_iterations: usize) -> Self {
        self.total_iterations = Some(total_iterations);
        self
    }

    /// Sets the initial learning rate.
    #[must_use]
    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    /// Builds the configuration, falling back to defaults for unset fields.
    ///
    /// Validation is deferred to [`OrdinalTrainingConfig::validate`],
    /// which the trainer calls before touching any data.
    #[must_use]
    pub fn build(self) -> OrdinalTrainingConfig {
        OrdinalTrainingConfig {
            total_iterations: self.total_iterations.unwrap_or_else(default_total_iterations),
            learning_rate: self.learning_rate.unwrap_or_else(default_learning_rate),
        }
    }
}
