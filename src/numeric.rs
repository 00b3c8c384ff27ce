//! Shared numeric primitives for the optimization loop.
//!
//! The gradient and cost computations lean on two saturated transcendental
//! functions. Saturation is not an approximation knob: beyond |z| = 30 the
//! exact values are indistinguishable from their limits in f64, and the
//! guards keep `exp` from overflowing when a threshold sits at infinity.

use std::collections::HashMap;
use std::hash::Hash;

use crate::store::ParamMap;

/// Saturation bound for [`sigmoid`] and [`log1p_exp`].
///
/// Arguments beyond this magnitude short-circuit to the asymptotic value
/// without evaluating `exp`.
pub const SATURATION_BOUND: f64 = 30.0;

/// Logistic sigmoid with saturation guards.
///
/// Returns exactly `1.0` for `z > 30`, exactly `0.0` for `z < -30`, and
/// `1 / (1 + e^-z)` otherwise. The guards also make the function total
/// over `±∞`, which the ordinal thresholds rely on.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    if z > SATURATION_BOUND {
        1.0
    } else if z < -SATURATION_BOUND {
        0.0
    } else {
        1.0 / (1.0 + (-z).exp())
    }
}

/// Saturated log-logistic loss term `log(1 + e^z)`.
///
/// Returns `z` itself for `z > 30` (the additive constant vanishes in
/// f64) and exactly `0.0` for `z < -30`.
#[must_use]
pub fn log1p_exp(z: f64) -> f64 {
    if z > SATURATION_BOUND {
        z
    } else if z < -SATURATION_BOUND {
        0.0
    } else {
        (1.0 + z.exp()).ln()
    }
}

/// Sparse dot product between a record's feature map and the weight map.
///
/// Zero-valued features are skipped, and features absent from the weight
/// map contribute nothing. The silent-skip policy for unknown features is
/// intentional: a prediction-time record may carry dimensions the model
/// never saw during training.
#[must_use]
pub fn sparse_dot<K>(features: &HashMap<K, f64>, weights: &ParamMap<K, f64>) -> f64
where
    K: Eq + Hash,
{
    let mut acc = 0.0;
    for (key, &value) in features {
        if value == 0.0 {
            continue;
        }
        if let Some(&w) = weights.peek(key) {
            acc += value * w;
        }
    }
    acc
}
