//! Training engine: ordinal regression fitted by full-batch gradient
//! descent with a bold-driver adaptive step size.
//!
//! # Algorithm
//!
//! Every iteration is a full pass over the training data. The engine
//! seeds scratch copies of the weight and threshold maps, accumulates
//! gradient contributions for every record against the *pre-iteration*
//! parameters (simultaneous update: no record sees another record's
//! update within an iteration), and scores the candidate with the mean
//! saturated log-logistic cost. The bold-driver rule then decides: a cost
//! above the best seen so far rejects the candidate and halves the
//! learning rate; anything else accepts it, grows the rate by 1.05, and
//! copies the scratch maps into the live parameters. Scratch maps are
//! disposed unconditionally at the end of the iteration either way.
//!
//! The loop is fixed-length. There is no convergence tolerance and no
//! minimum-rate floor: the iteration budget is the only stop condition,
//! and a caller wanting an earlier stop trains with a smaller budget.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::checkpoint::ModelCheckpoint;
use crate::config::OrdinalTrainingConfig;
use crate::dataset::Dataset;
use crate::error::{TrainResult, TrainingError};
use crate::metrics::{IterationMetrics, TrainingReport, ValidationMetrics};
use crate::model::OrdinalModelParameters;
use crate::numeric::{log1p_exp, sigmoid, sparse_dot};
use crate::predictor;
use crate::store::{ParamMap, ParameterStore, StorageConfig};
use crate::TrainableModel;

/// Scratch map name for the candidate weights of one iteration.
const SCRATCH_WEIGHTS: &str = "tmp_new_weights";

/// Scratch map name for the candidate thresholds of one iteration.
const SCRATCH_THRESHOLDS: &str = "tmp_new_thresholds";

/// Growth factor applied to the learning rate on an accepted step.
const RATE_GROWTH: f64 = 1.05;

/// Ordinal regression classifier with pluggable parameter storage.
///
/// One weight per feature and one threshold per class along a shared
/// latent line. Construct with [`OrdinalRegression::new`], fit with
/// [`train`](Self::train), then [`predict`](Self::predict) or
/// [`validate`](Self::validate). The learned parameters stay owned by
/// this instance until [`erase`](Self::erase) releases them back to the
/// store.
#[derive(Debug)]
pub struct OrdinalRegression<K: Eq + Hash, C: Ord + Hash> {
    store: ParameterStore,
    params: Option<OrdinalModelParameters<K, C>>,
    report: Option<TrainingReport>,
}

impl<K, C> OrdinalRegression<K, C>
where
    K: Eq + Hash + Clone,
    C: Ord + Hash + Clone,
{
    /// Creates an untrained model whose parameter maps will be
    /// materialized through a store with the given configuration.
    #[must_use]
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            store: ParameterStore::new(storage),
            params: None,
            report: None,
        }
    }

    /// Returns whether the model has been trained.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.params.is_some()
    }

    /// The learned parameters, if training has completed.
    #[must_use]
    pub fn params(&self) -> Option<&OrdinalModelParameters<K, C>> {
        self.params.as_ref()
    }

    /// The backing parameter store.
    #[must_use]
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Per-iteration telemetry from the most recent training run.
    #[must_use]
    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    /// Releases the learned parameters back to the store.
    ///
    /// After erasure the model can be trained again. Erasing an untrained
    /// model is a no-op.
    pub fn erase(&mut self) {
        if let Some(params) = self.params.take() {
            params.dispose_into(&mut self.store);
        }
        self.report = None;
    }

    /// Fits the model on the given dataset.
    ///
    /// Runs exactly `config.total_iterations` full-batch iterations and
    /// mutates the internal parameters in place; there is no return value
    /// beyond the side effect.
    ///
    /// # Errors
    ///
    /// - [`TrainingError::InvalidConfiguration`] for a zero iteration
    ///   budget or non-positive learning rate
    /// - [`TrainingError::InsufficientData`] for an empty dataset
    /// - [`TrainingError::InvalidTraining`] for fewer than two distinct
    ///   classes, an unlabeled training record, or a model that is
    ///   already trained (call [`erase`](Self::erase) first)
    /// - [`TrainingError::Store`] if a parameter map cannot be created
    pub fn train(
        &mut self,
        data: &Dataset<K, C>,
        config: &OrdinalTrainingConfig,
    ) -> TrainResult<()> {
        config.validate()?;
        if self.params.is_some() {
            return Err(TrainingError::InvalidTraining {
                detail: "model is already trained; erase() before retraining".to_string(),
            });
        }
        if data.is_empty() {
            return Err(TrainingError::InsufficientData {
                detail: "training dataset has no records".to_string(),
            });
        }

        let mut classes: BTreeSet<C> = BTreeSet::new();
        for record in data {
            match record.label() {
                Some(class) => {
                    classes.insert(class.clone());
                }
                None => {
                    return Err(TrainingError::InvalidTraining {
                        detail: "training record without a label".to_string(),
                    });
                }
            }
        }
        if classes.len() < 2 {
            return Err(TrainingError::InvalidTraining {
                detail: format!(
                    "ordinal regression requires at least 2 distinct classes, got {}",
                    classes.len()
                ),
            });
        }

        let mut params = OrdinalModelParameters::materialize(&mut self.store)?;
        params.set_sample_count(data.len());
        params.set_feature_count(data.column_count());
        let class_list: Vec<C> = classes.iter().cloned().collect();
        params.set_classes(classes);

        // Zero-init one weight per feature and one threshold per class;
        // the maximal class's threshold is the open upper boundary.
        for record in data {
            for feature in record.features().keys() {
                params.weights_mut().put(feature.clone(), 0.0);
            }
        }
        for class in &class_list {
            params.thresholds_mut().put(class.clone(), 0.0);
        }
        if let Some(last) = class_list.last() {
            params.thresholds_mut().put(last.clone(), f64::INFINITY);
        }

        let previous = params.previous_class_map();

        let mut learning_rate = config.learning_rate;
        let mut min_error = f64::INFINITY;
        let mut report = TrainingReport::with_capacity(config.total_iterations);

        for iteration in 0..config.total_iterations {
            let mut new_weights: ParamMap<K, f64> = self.store.create(SCRATCH_WEIGHTS)?;
            let mut new_thresholds: ParamMap<C, f64> = self.store.create(SCRATCH_THRESHOLDS)?;
            new_weights.copy_from(params.weights());
            new_thresholds.copy_from(params.thresholds());

            batch_gradient_step(
                data,
                &previous,
                params.weights(),
                params.thresholds(),
                params.sample_count(),
                learning_rate,
                &mut new_weights,
                &mut new_thresholds,
            );

            let new_error = mean_cost(data, &previous, &new_weights, &new_thresholds);

            // Bold driver: reject on any cost increase, halving the rate;
            // accept otherwise and press harder.
            let accepted = !(new_error > min_error);
            if accepted {
                learning_rate *= RATE_GROWTH;
                min_error = new_error;
                params.weights_mut().copy_from(&new_weights);
                params.thresholds_mut().copy_from(&new_thresholds);
            } else {
                learning_rate /= 2.0;
            }

            tracing::debug!(
                iteration,
                cost = new_error,
                accepted,
                learning_rate,
                "iteration complete"
            );
            report.record(IterationMetrics {
                iteration,
                candidate_cost: new_error,
                accepted,
                best_cost: min_error,
                learning_rate,
            });

            self.store.dispose(SCRATCH_WEIGHTS, new_weights);
            self.store.dispose(SCRATCH_THRESHOLDS, new_thresholds);
        }

        self.params = Some(params);
        self.report = Some(report);
        Ok(())
    }

    /// Annotates every record with a predicted label and per-class
    /// probabilities.
    ///
    /// Features the model never saw during training contribute nothing
    /// to the projection; they are skipped, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::ModelNotTrained`] if called before
    /// training.
    pub fn predict(&self, data: &mut Dataset<K, C>) -> TrainResult<()> {
        let params = self.params.as_ref().ok_or(TrainingError::ModelNotTrained)?;
        let previous = params.previous_class_map();
        predictor::predict_into(params, &previous, data);
        Ok(())
    }

    /// Scores the model against a held-out dataset.
    ///
    /// Runs prediction over the dataset, then measures accuracy over the
    /// labeled records and the mean cost of the final parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::ModelNotTrained`] before training, or
    /// [`TrainingError::InsufficientData`] if the dataset is empty or
    /// carries no labeled records.
    pub fn validate(&self, data: &mut Dataset<K, C>) -> TrainResult<ValidationMetrics> {
        let params = self.params.as_ref().ok_or(TrainingError::ModelNotTrained)?;
        if data.is_empty() {
            return Err(TrainingError::InsufficientData {
                detail: "validation dataset has no records".to_string(),
            });
        }

        self.predict(data)?;

        let mut labeled = 0usize;
        let mut correct = 0usize;
        for record in data.records() {
            if let Some(label) = record.label() {
                labeled += 1;
                if record.predicted_label() == Some(label) {
                    correct += 1;
                }
            }
        }
        if labeled == 0 {
            return Err(TrainingError::InsufficientData {
                detail: "validation dataset has no labeled records".to_string(),
            });
        }

        let accuracy = correct as f64 / labeled as f64;
        let previous = params.previous_class_map();
        let cost = mean_cost(data, &previous, params.weights(), params.thresholds());

        Ok(ValidationMetrics {
            accuracy,
            sum_squared_error: cost,
            count_r_square: accuracy,
        })
    }
}

impl<K, C> OrdinalRegression<K, C>
where
    K: Eq + Hash + Clone + serde::Serialize + serde::de::DeserializeOwned,
    C: Ord + Hash + Clone + serde::Serialize + serde::de::DeserializeOwned,
{
    /// Saves the trained parameters to a checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::ModelNotTrained`] before training, or
    /// [`TrainingError::Checkpoint`] on persistence failure.
    pub fn save_checkpoint<P: AsRef<std::path::Path>>(&self, path: P) -> TrainResult<()> {
        let params = self.params.as_ref().ok_or(TrainingError::ModelNotTrained)?;
        ModelCheckpoint::capture(params).save(path)
    }

    /// Loads a trained model from a checkpoint file.
    ///
    /// The restored model materializes its maps through a fresh store
    /// with the given configuration and is immediately ready for
    /// prediction. Per-iteration telemetry is not persisted and starts
    /// out absent on the restored model.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if loading fails, or a
    /// store error if the manifest maps cannot be created.
    pub fn load_checkpoint<P: AsRef<std::path::Path>>(
        path: P,
        storage: StorageConfig,
    ) -> TrainResult<Self> {
        let checkpoint = ModelCheckpoint::load(path)?;
        let mut store = ParameterStore::new(storage);
        let params = checkpoint.restore(&mut store)?;
        Ok(Self {
            store,
            params: Some(params),
            report: None,
        })
    }
}

impl<K, C> TrainableModel<K, C> for OrdinalRegression<K, C>
where
    K: Eq + Hash + Clone,
    C: Ord + Hash + Clone,
{
    type Config = OrdinalTrainingConfig;
    type Metrics = ValidationMetrics;

    fn train(&mut self, data: &Dataset<K, C>, config: &Self::Config) -> TrainResult<()> {
        OrdinalRegression::train(self, data, config)
    }

    fn predict(&self, data: &mut Dataset<K, C>) -> TrainResult<()> {
        OrdinalRegression::predict(self, data)
    }

    fn validate(&self, data: &mut Dataset<K, C>) -> TrainResult<Self::Metrics> {
        OrdinalRegression::validate(self, data)
    }
}

/// One full-batch gradient accumulation pass.
///
/// Reads only the pre-iteration `weights`/`thresholds` and writes only
/// the scratch maps, so every record's contribution is computed against
/// the same parameter snapshot. Contributions to a given key are a
/// commutative sum; record visit order does not matter.
#[allow(clippy::too_many_arguments)]
fn batch_gradient_step<K, C>(
    data: &Dataset<K, C>,
    previous: &HashMap<C, Option<C>>,
    weights: &ParamMap<K, f64>,
    thresholds: &ParamMap<C, f64>,
    sample_count: usize,
    learning_rate: f64,
    new_weights: &mut ParamMap<K, f64>,
    new_thresholds: &mut ParamMap<C, f64>,
) where
    K: Eq + Hash + Clone,
    C: Ord + Hash + Clone,
{
    let multiplier = -learning_rate / sample_count as f64;

    for record in data {
        let Some(class) = record.label() else {
            continue;
        };
        let prev_class = previous.get(class).and_then(Option::as_ref);

        let x_t_w = sparse_dot(record.features(), weights);

        let theta = thresholds.peek(class).copied().unwrap_or(f64::INFINITY);
        let g_current = sigmoid(x_t_w - theta);
        let g_previous = match prev_class {
            Some(prev) => {
                let theta_prev = thresholds.peek(prev).copied().unwrap_or(0.0);
                sigmoid(theta_prev - x_t_w)
            }
            None => 0.0,
        };

        let weight_scale = multiplier * (g_current - g_previous);
        for (feature, &value) in record.features() {
            let current = new_weights.peek(feature).copied().unwrap_or(0.0);
            new_weights.put(feature.clone(), current + weight_scale * value);
        }

        let current = new_thresholds.peek(class).copied().unwrap_or(0.0);
        new_thresholds.put(class.clone(), current + multiplier * (-g_current));
        if let Some(prev) = prev_class {
            let current = new_thresholds.peek(prev).copied().unwrap_or(0.0);
            new_thresholds.put(prev.clone(), current + multiplier * g_previous);
        }
    }
}

/// Mean saturated log-logistic cost of the given parameters over the
/// labeled records of a dataset.
pub(crate) fn mean_cost<K, C>(
    data: &Dataset<K, C>,
    previous: &HashMap<C, Option<C>>,
    weights: &ParamMap<K, f64>,
    thresholds: &ParamMap<C, f64>,
) -> f64
where
    K: Eq + Hash,
    C: Ord + Hash + Clone,
{
    let mut error = 0.0;
    let mut labeled = 0usize;

    for record in data {
        let Some(class) = record.label() else {
            continue;
        };
        let x_t_w = sparse_dot(record.features(), weights);

        if let Some(prev) = previous.get(class).and_then(Option::as_ref) {
            let theta_prev = thresholds.peek(prev).copied().unwrap_or(0.0);
            error += log1p_exp(theta_prev - x_t_w);
        }
        let theta = thresholds.peek(class).copied().unwrap_or(f64::INFINITY);
        error += log1p_exp(x_t_w - theta);
        labeled += 1;
    }

    if labeled == 0 {
        0.0
    } else {
        error / labeled as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn record(x1: f64, x2: f64, label: u8) -> Record<&'static str, u8> {
        Record::labeled([("x1", x1), ("x2", x2)].into_iter().collect(), label)
    }

    fn two_class_data() -> Dataset<&'static str, u8> {
        let mut data = Dataset::new();
        for i in 0..5 {
            data.push(record(1.0 + 0.1 * f64::from(i), 1.5, 0));
            data.push(record(5.0 + 0.1 * f64::from(i), 5.5, 1));
        }
        data
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let mut model: OrdinalRegression<&str, u8> = OrdinalRegression::new(StorageConfig::default());
        let err = model
            .train(&Dataset::new(), &OrdinalTrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, TrainingError::InsufficientData { .. }));
    }

    #[test]
    fn single_class_is_rejected() {
        let mut data = Dataset::new();
        data.push(record(1.0, 2.0, 0));
        data.push(record(1.5, 2.5, 0));

        let mut model = OrdinalRegression::new(StorageConfig::default());
        let err = model
            .train(&data, &OrdinalTrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidTraining { .. }));
    }

    #[test]
    fn unlabeled_training_record_is_rejected() {
        let mut data = two_class_data();
        data.push(Record::unlabeled([("x1", 1.0)].into_iter().collect()));

        let mut model = OrdinalRegression::new(StorageConfig::default());
        let err = model
            .train(&data, &OrdinalTrainingConfig::default())
            .unwrap_err();
        assert!(matches!(err, TrainingError::InvalidTraining { .. }));
    }

    #[test]
    fn retraining_requires_erase() {
        let data = two_class_data();
        let config = OrdinalTrainingConfig::builder().total_iterations(2).build();

        let mut model = OrdinalRegression::new(StorageConfig::default());
        model.train(&data, &config).unwrap();
        assert!(matches!(
            model.train(&data, &config),
            Err(TrainingError::InvalidTraining { .. })
        ));

        model.erase();
        assert!(!model.is_trained());
        model.train(&data, &config).unwrap();
    }

    #[test]
    fn predict_before_train_fails() {
        let model: OrdinalRegression<&str, u8> = OrdinalRegression::new(StorageConfig::default());
        let mut data = two_class_data();
        assert!(matches!(
            model.predict(&mut data),
            Err(TrainingError::ModelNotTrained)
        ));
        assert!(matches!(
            model.validate(&mut data),
            Err(TrainingError::ModelNotTrained)
        ));
    }

    #[test]
    fn best_cost_is_monotone_non_increasing() {
        let data = two_class_data();
        let config = OrdinalTrainingConfig::builder()
            .total_iterations(50)
            .learning_rate(0.1)
            .build();

        let mut model = OrdinalRegression::new(StorageConfig::default());
        model.train(&data, &config).unwrap();

        let report = model.training_report().unwrap();
        assert_eq!(report.iterations().len(), 50);
        let mut best = f64::INFINITY;
        for metrics in report.iterations() {
            assert!(metrics.best_cost <= best, "best cost increased");
            best = metrics.best_cost;
        }
    }

    #[test]
    fn bold_driver_adjusts_rate_per_outcome() {
        // Overlapping clusters give the cost a finite optimum, so the
        // growing rate must eventually overshoot and get rejected.
        let mut data = Dataset::new();
        for i in 0..5 {
            data.push(record(1.0 + f64::from(i), 2.0, 0));
            data.push(record(3.0 + f64::from(i), 4.0, 1));
        }
        let config = OrdinalTrainingConfig::builder()
            .total_iterations(80)
            .learning_rate(50.0)
            .build();

        let mut model = OrdinalRegression::new(StorageConfig::default());
        model.train(&data, &config).unwrap();

        let report = model.training_report().unwrap();
        let mut rate = config.learning_rate;
        for metrics in report.iterations() {
            let expected = if metrics.accepted {
                rate * RATE_GROWTH
            } else {
                rate / 2.0
            };
            assert_eq!(metrics.learning_rate, expected);
            rate = metrics.learning_rate;
        }
        assert!(report.accepted_count() < report.iterations().len());
    }

    #[test]
    fn final_threshold_is_infinite() {
        let data = two_class_data();
        let mut model = OrdinalRegression::new(StorageConfig::default());
        model
            .train(&data, &OrdinalTrainingConfig::default())
            .unwrap();

        let params = model.params().unwrap();
        assert_eq!(params.thresholds().peek(&1), Some(&f64::INFINITY));
        assert!(params.thresholds().peek(&0).unwrap().is_finite());
    }

    #[test]
    fn counts_reflect_training_data() {
        let data = two_class_data();
        let mut model = OrdinalRegression::new(StorageConfig::default());
        model
            .train(&data, &OrdinalTrainingConfig::default())
            .unwrap();

        let params = model.params().unwrap();
        assert_eq!(params.sample_count(), 10);
        assert_eq!(params.feature_count(), 2);
        assert_eq!(params.class_count(), 2);
        assert_eq!(params.weights().len(), 2);
    }
}
