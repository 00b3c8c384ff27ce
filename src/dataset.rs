//! Dataset and record types consumed by the training and prediction
//! engines.
//!
//! These are the collaborator boundary of the framework: surrounding
//! data-loading code builds a [`Dataset`] of labeled feature maps, the
//! engines iterate it, and prediction writes its outputs back onto each
//! [`Record`]. Feature keys and class labels are generic; the only
//! requirements are hashability for features and a total order for
//! classes, since the class order *is* the ordinal ranking.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// One labeled (or unlabeled) observation.
///
/// Prediction outputs are write-once per prediction call: the engine
/// overwrites both fields together, never one without the other.
#[derive(Debug, Clone)]
pub struct Record<K, C> {
    features: HashMap<K, f64>,
    label: Option<C>,
    predicted_label: Option<C>,
    predicted_probabilities: Option<HashMap<C, f64>>,
}

impl<K, C> Record<K, C>
where
    K: Eq + Hash,
    C: Eq + Hash,
{
    /// Creates a labeled record.
    #[must_use]
    pub fn labeled(features: HashMap<K, f64>, label: C) -> Self {
        Self {
            features,
            label: Some(label),
            predicted_label: None,
            predicted_probabilities: None,
        }
    }

    /// Creates an unlabeled record, e.g. for prediction-only datasets.
    #[must_use]
    pub fn unlabeled(features: HashMap<K, f64>) -> Self {
        Self {
            features,
            label: None,
            predicted_label: None,
            predicted_probabilities: None,
        }
    }

    /// The record's feature map.
    #[must_use]
    pub fn features(&self) -> &HashMap<K, f64> {
        &self.features
    }

    /// The supervised label, if the record carries one.
    #[must_use]
    pub fn label(&self) -> Option<&C> {
        self.label.as_ref()
    }

    /// The label assigned by the most recent prediction call, if any.
    #[must_use]
    pub fn predicted_label(&self) -> Option<&C> {
        self.predicted_label.as_ref()
    }

    /// Per-class scores from the most recent prediction call, if any.
    ///
    /// The scores form a CDF-difference partition over the ordinal line
    /// and are not renormalized; see the predictor module for details.
    #[must_use]
    pub fn predicted_probabilities(&self) -> Option<&HashMap<C, f64>> {
        self.predicted_probabilities.as_ref()
    }

    pub(crate) fn set_prediction(&mut self, label: C, probabilities: HashMap<C, f64>) {
        self.predicted_label = Some(label);
        self.predicted_probabilities = Some(probabilities);
    }
}

/// An ordered collection of records.
#[derive(Debug, Clone)]
pub struct Dataset<K, C> {
    records: Vec<Record<K, C>>,
}

impl<K, C> Default for Dataset<K, C> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<K, C> Dataset<K, C>
where
    K: Eq + Hash,
    C: Eq + Hash,
{
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record, preserving insertion order.
    pub fn push(&mut self, record: Record<K, C>) {
        self.records.push(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record<K, C>] {
        &self.records
    }

    /// Mutable access to the records, used by prediction to write outputs.
    pub fn records_mut(&mut self) -> &mut [Record<K, C>] {
        &mut self.records
    }

    /// Number of distinct feature keys across all records.
    #[must_use]
    pub fn column_count(&self) -> usize {
        let mut columns: HashSet<&K> = HashSet::new();
        for record in &self.records {
            columns.extend(record.features.keys());
        }
        columns.len()
    }
}

impl<K, C> From<Vec<Record<K, C>>> for Dataset<K, C> {
    fn from(records: Vec<Record<K, C>>) -> Self {
        Self { records }
    }
}

impl<'a, K, C> IntoIterator for &'a Dataset<K, C> {
    type Item = &'a Record<K, C>;
    type IntoIter = std::slice::Iter<'a, Record<K, C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(&'static str, f64)]) -> HashMap<&'static str, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn column_count_spans_records() {
        let mut data: Dataset<&str, u8> = Dataset::new();
        data.push(Record::labeled(features(&[("x1", 1.0), ("x2", 2.0)]), 0));
        data.push(Record::labeled(features(&[("x2", 3.0), ("x3", 4.0)]), 1));
        assert_eq!(data.column_count(), 3);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn prediction_outputs_start_empty() {
        let record: Record<&str, u8> = Record::unlabeled(features(&[("x1", 1.0)]));
        assert!(record.label().is_none());
        assert!(record.predicted_label().is_none());
        assert!(record.predicted_probabilities().is_none());
    }
}
