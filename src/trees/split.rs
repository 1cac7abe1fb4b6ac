//! Exhaustive search for the best (feature, threshold) split of a node.
use super::impurity::Criterion;
use crate::data::dataset::{Number, WholeNumber};
use nalgebra::DMatrix;

/// The winning split of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitData<XT: Number> {
    pub feature_index: usize,
    pub threshold: XT,
    pub information_gain: f64,
}

/// Distinct values of one column in ascending order.
pub fn candidate_thresholds<XT: Number>(x: &DMatrix<XT>, feature_index: usize) -> Vec<XT> {
    let mut unique_values: Vec<_> = x.column(feature_index).iter().cloned().collect();
    unique_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    unique_values.dedup();
    unique_values
}

/// Scans every feature (ascending index) and every distinct value of it (ascending)
/// and returns the first candidate reaching the highest strictly positive gain.
///
/// Rows with `value < threshold` go left, the rest go right. Candidates leaving either
/// side empty are skipped. Returns `None` when no candidate improves on the parent.
pub fn find_best_split<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    y: &[YT],
    parent_impurity: f64,
    criterion: Criterion,
) -> Option<SplitData<XT>> {
    let num_samples = y.len();
    let mut best_split: Option<SplitData<XT>> = None;
    let mut best_information_gain = 0.0;

    for feature_index in 0..x.ncols() {
        for threshold in candidate_thresholds(x, feature_index) {
            let (left_y, right_y) = partition_labels(x, y, feature_index, threshold);

            if left_y.is_empty() || right_y.is_empty() {
                continue;
            }

            let weight_left = left_y.len() as f64 / num_samples as f64;
            let weight_right = right_y.len() as f64 / num_samples as f64;
            let weighted_impurity = weight_left * criterion.impurity(&left_y)
                + weight_right * criterion.impurity(&right_y);
            let information_gain = parent_impurity - weighted_impurity;

            if information_gain > best_information_gain {
                best_split = Some(SplitData {
                    feature_index,
                    threshold,
                    information_gain,
                });
                best_information_gain = information_gain;
            }
        }
    }
    best_split
}

/// Labels of the rows going left (`value < threshold`) and right.
fn partition_labels<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    y: &[YT],
    feature_index: usize,
    threshold: XT,
) -> (Vec<YT>, Vec<YT>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (row, label) in y.iter().enumerate() {
        if x[(row, feature_index)] < threshold {
            left.push(*label);
        } else {
            right.push(*label);
        }
    }
    (left, right)
}
