//! Validation metrics and per-iteration training telemetry.
//!
//! Two kinds of measurement live here. [`ValidationMetrics`] scores a
//! converged model against held-out data. [`TrainingReport`] records what
//! the optimization loop did at each iteration, which is how the
//! bold-driver schedule is observed from the outside: the engine itself
//! exposes no mid-run hooks.

use serde::{Deserialize, Serialize};

use crate::error::{TrainResult, TrainingError};

/// Quality measures for a trained model against a validation dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Fraction of labeled records whose predicted label matches.
    pub accuracy: f64,

    /// Mean saturated log-logistic cost of the final parameters over the
    /// validation set. Kept under its historical name; it is a mean cost,
    /// not a literal sum of squares.
    pub sum_squared_error: f64,

    /// Count-based pseudo-R². For this model family it is defined equal
    /// to accuracy, not the classical coefficient of determination.
    pub count_r_square: f64,
}

impl ValidationMetrics {
    /// Serializes the metrics as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if serialization fails.
    pub fn to_json(&self) -> TrainResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TrainingError::Checkpoint {
            reason: format!("failed to serialize metrics: {e}"),
        })
    }
}

/// What the optimization loop did in one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    /// Zero-based iteration index.
    pub iteration: usize,

    /// Mean cost of the candidate parameters over the training set.
    pub candidate_cost: f64,

    /// Whether the bold-driver rule accepted the candidate.
    pub accepted: bool,

    /// Best (lowest) cost retained so far, after this iteration.
    pub best_cost: f64,

    /// Learning rate in effect after this iteration's adjustment.
    pub learning_rate: f64,
}

/// Per-iteration record of one training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingReport {
    iterations: Vec<IterationMetrics>,
}

impl TrainingReport {
    pub(crate) fn with_capacity(total_iterations: usize) -> Self {
        Self {
            iterations: Vec::with_capacity(total_iterations),
        }
    }

    pub(crate) fn record(&mut self, metrics: IterationMetrics) {
        self.iterations.push(metrics);
    }

    /// The per-iteration records, in order.
    #[must_use]
    pub fn iterations(&self) -> &[IterationMetrics] {
        &self.iterations
    }

    /// Number of iterations whose candidate was accepted.
    #[must_use]
    pub fn accepted_count(&self) -> usize {
        self.iterations.iter().filter(|m| m.accepted).count()
    }

    /// Best cost retained at the end of the run, if any iteration ran.
    #[must_use]
    pub fn final_best_cost(&self) -> Option<f64> {
        self.iterations.last().map(|m| m.best_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_json_round_trip() {
        let metrics = ValidationMetrics {
            accuracy: 0.9,
            sum_squared_error: 0.12,
            count_r_square: 0.9,
        };
        let json = metrics.to_json().unwrap();
        let back: ValidationMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metrics);
    }

    #[test]
    fn report_counts_acceptances() {
        let mut report = TrainingReport::with_capacity(3);
        for (i, accepted) in [true, false, true].into_iter().enumerate() {
            report.record(IterationMetrics {
                iteration: i,
                candidate_cost: 1.0,
                accepted,
                best_cost: 1.0,
                learning_rate: 0.1,
            });
        }
        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.iterations().len(), 3);
    }
}
