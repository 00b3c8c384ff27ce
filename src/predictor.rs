//! Prediction engine: applies converged model parameters to new records.
//!
//! For a record with feature map `x`, the model projects `x` onto the
//! latent ordinal line via the shared weight vector and reads class
//! membership off the per-class thresholds: the probability of class `c`
//! is `σ(θ_c − xᵀw) − σ(θ_prev − xᵀw)`, the mass between the class's two
//! boundaries. The first class has no lower boundary and keeps the whole
//! left tail.
//!
//! # Output contract
//!
//! The per-class values form a discretized CDF-difference partition over
//! the ordinal line. They are **not renormalized** and may not sum to
//! exactly 1 under floating-point rounding and sigmoid saturation;
//! callers needing a strict distribution must renormalize explicitly.
//! The predicted label is the argmax, and ties break toward the first
//! class reached in ascending ordinal order.

use std::collections::HashMap;
use std::hash::Hash;

use crate::dataset::{Dataset, Record};
use crate::model::OrdinalModelParameters;
use crate::numeric::{sigmoid, sparse_dot};

/// Computes the per-class probability partition for one feature map.
pub(crate) fn class_probabilities<K, C>(
    params: &OrdinalModelParameters<K, C>,
    previous: &HashMap<C, Option<C>>,
    features: &HashMap<K, f64>,
) -> HashMap<C, f64>
where
    K: Eq + Hash,
    C: Ord + Hash + Clone,
{
    let x_t_w = sparse_dot(features, params.weights());
    let thresholds = params.thresholds();

    let mut probabilities = HashMap::with_capacity(params.class_count());
    for class in params.classes() {
        let upper = thresholds.peek(class).copied().unwrap_or(f64::INFINITY);
        let g_upper = sigmoid(upper - x_t_w);

        let probability = match previous.get(class).and_then(Option::as_ref) {
            Some(prev) => {
                let lower = thresholds.peek(prev).copied().unwrap_or(0.0);
                g_upper - sigmoid(lower - x_t_w)
            }
            None => g_upper,
        };
        probabilities.insert(class.clone(), probability);
    }
    probabilities
}

/// Selects the predicted class: strict argmax, ties broken toward the
/// first class in ascending ordinal order.
pub(crate) fn select_class<'a, C>(
    classes: impl IntoIterator<Item = &'a C>,
    probabilities: &HashMap<C, f64>,
) -> Option<C>
where
    C: Ord + Hash + Clone + 'a,
{
    let mut best: Option<(&C, f64)> = None;
    for class in classes {
        let score = probabilities.get(class).copied().unwrap_or(0.0);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((class, score)),
        }
    }
    best.map(|(class, _)| class.clone())
}

/// Annotates every record in the dataset with a predicted label and the
/// per-class probability partition.
pub(crate) fn predict_into<K, C>(
    params: &OrdinalModelParameters<K, C>,
    previous: &HashMap<C, Option<C>>,
    dataset: &mut Dataset<K, C>,
) where
    K: Eq + Hash,
    C: Ord + Hash + Clone,
{
    for record in dataset.records_mut() {
        annotate(params, previous, record);
    }
}

fn annotate<K, C>(
    params: &OrdinalModelParameters<K, C>,
    previous: &HashMap<C, Option<C>>,
    record: &mut Record<K, C>,
) where
    K: Eq + Hash,
    C: Ord + Hash + Clone,
{
    let probabilities = class_probabilities(params, previous, record.features());
    if let Some(label) = select_class(params.classes(), &probabilities) {
        record.set_prediction(label, probabilities);
    }
}
