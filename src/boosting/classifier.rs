use std::marker::PhantomData;

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{debug, info};

use super::params::BoostingParams;
use crate::{
    data::dataset::{Dataset, Number, WholeNumber},
    error::ModelError,
    metrics::confusion::ClassificationMetrics,
    trees::classifier::DecisionTreeClassifier,
};

/// Keeps the confidence weight finite and every sample weight strictly positive.
const EPSILON: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoostingVisualization {
    pub n_estimators: usize,
    pub estimator_weights: Vec<f64>,
    pub estimator_count: usize,
}

/// AdaBoost over depth-1 decision trees.
///
/// Binary only: label `0` is the negative class and every other label the positive one.
/// Predictions are `1` when the weighted vote is strictly positive and `0` otherwise.
#[derive(Clone, Debug)]
pub struct AdaBoostClassifier<XT: Number, YT: WholeNumber> {
    estimators: Vec<DecisionTreeClassifier<XT, i8>>,
    estimator_weights: Vec<f64>,
    boosting_params: BoostingParams,

    _marker: PhantomData<YT>,
}

impl<XT: Number, YT: WholeNumber> Default for AdaBoostClassifier<XT, YT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<XT: Number, YT: WholeNumber> ClassificationMetrics<YT> for AdaBoostClassifier<XT, YT> {}

impl<XT: Number, YT: WholeNumber> AdaBoostClassifier<XT, YT> {
    pub fn new() -> Self {
        Self::from_params(BoostingParams::new())
    }

    pub fn from_params(boosting_params: BoostingParams) -> Self {
        Self {
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            boosting_params,
            _marker: PhantomData,
        }
    }

    pub fn with_params(num_estimators: Option<usize>) -> Result<Self, ModelError> {
        let mut booster = Self::new();
        if let Some(num_estimators) = num_estimators {
            booster.set_num_estimators(num_estimators)?;
        }
        Ok(booster)
    }

    pub fn set_num_estimators(&mut self, num_estimators: usize) -> Result<(), ModelError> {
        self.boosting_params.set_num_estimators(num_estimators)
    }

    pub fn num_estimators(&self) -> usize {
        self.boosting_params.num_estimators()
    }

    pub fn is_trained(&self) -> bool {
        !self.estimators.is_empty()
    }

    /// Confidence weight of every trained stump, in training order.
    pub fn estimator_weights(&self) -> &[f64] {
        &self.estimator_weights
    }

    /// Trains `num_estimators` stumps, reweighting the samples after each round.
    ///
    /// Stumps are grown on the full, unweighted dataset. The sample weights only drive the
    /// weighted error of each stump and the reweighting that follows it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the dataset is empty or inconsistent. On error the
    /// previously trained ensemble, if any, is left untouched.
    pub fn fit(&mut self, dataset: &Dataset<XT, YT>) -> Result<(), ModelError> {
        dataset.validate()?;

        let signed = Dataset::new(
            dataset.x.clone(),
            dataset
                .y
                .map(|label| if label.is_zero() { -1i8 } else { 1i8 }),
        );
        let num_samples = signed.nrows();
        let num_estimators = self.num_estimators();

        let mut sample_weights = vec![1.0 / num_samples as f64; num_samples];
        let mut estimators = Vec::with_capacity(num_estimators);
        let mut estimator_weights = Vec::with_capacity(num_estimators);

        for round in 0..num_estimators {
            let mut stump = DecisionTreeClassifier::with_params(None, None, Some(1))?;
            stump.fit_weighted(&signed, Some(&sample_weights))?;
            let predictions = signed_predictions(&stump, &signed.x)?;

            let error = weighted_error(&sample_weights, &predictions, &signed.y);
            let alpha = 0.5 * ((1.0 - error) / (error + EPSILON)).ln();
            reweight(&mut sample_weights, &predictions, &signed.y, alpha);

            debug!(round, error, alpha, "Finished boosting round.");
            estimators.push(stump);
            estimator_weights.push(alpha);
        }

        info!(estimators = estimators.len(), "Finished boosting.");
        self.estimators = estimators;
        self.estimator_weights = estimator_weights;
        Ok(())
    }

    /// Confidence-weighted vote `sum(alpha_t * stump_t(row))` with stump outputs in {-1, +1}.
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` before `fit`, and a validation error if `features` has a
    /// different number of columns than the training data.
    pub fn decision_function(&self, features: &DMatrix<XT>) -> Result<DVector<f64>, ModelError> {
        if self.estimators.is_empty() {
            return Err(ModelError::NotTrained);
        }
        let mut scores = DVector::<f64>::zeros(features.nrows());
        for (stump, &alpha) in self.estimators.iter().zip(self.estimator_weights.iter()) {
            let predictions = signed_predictions(stump, features)?;
            scores += predictions.map(|prediction| alpha * f64::from(prediction));
        }
        Ok(scores)
    }

    /// Predicts `1` for a strictly positive score and `0` otherwise.
    pub fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        let scores = self.decision_function(features)?;
        Ok(scores.map(|score| if score > 0.0 { YT::one() } else { YT::zero() }))
    }

    pub fn visualization_data(&self) -> Option<BoostingVisualization> {
        if self.estimators.is_empty() {
            return None;
        }
        Some(BoostingVisualization {
            n_estimators: self.num_estimators(),
            estimator_weights: self.estimator_weights.clone(),
            estimator_count: self.estimators.len(),
        })
    }
}

/// Weighted share of misclassified rows, capped just below 1.
fn weighted_error(weights: &[f64], predictions: &DVector<i8>, truth: &DVector<i8>) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    let misclassified: f64 = weights
        .iter()
        .zip(predictions.iter().zip(truth.iter()))
        .filter(|(_, (prediction, truth))| prediction != truth)
        .map(|(&weight, _)| weight)
        .sum();
    (misclassified / total_weight).min(1.0 - EPSILON)
}

/// Scales every weight by `exp(-alpha * truth * prediction)`, floors it at `EPSILON` and
/// renormalises to a sum of 1.
fn reweight(weights: &mut [f64], predictions: &DVector<i8>, truth: &DVector<i8>, alpha: f64) {
    for (weight, (&prediction, &truth)) in weights
        .iter_mut()
        .zip(predictions.iter().zip(truth.iter()))
    {
        let agreement = f64::from(truth) * f64::from(prediction);
        *weight = (*weight * (-alpha * agreement).exp()).max(EPSILON);
    }
    let norm: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|weight| *weight /= norm);
}

/// Stump output mapped back onto {-1, +1}.
///
/// The tree reports {-1, +1} training labels as {0, 1}; a stump trained on a single class
/// keeps that class as is.
fn signed_predictions<XT: Number>(
    stump: &DecisionTreeClassifier<XT, i8>,
    features: &DMatrix<XT>,
) -> Result<DVector<i8>, ModelError> {
    Ok(stump
        .predict(features)?
        .map(|prediction| if prediction > 0 { 1 } else { -1 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(labels: Vec<i32>) -> Dataset<f64, i32> {
        let x = DMatrix::from_fn(labels.len(), 1, |row, _| (row + 1) as f64);
        Dataset::new(x, DVector::from_vec(labels))
    }

    #[test]
    fn test_separable_data() {
        let dataset = line(vec![0, 0, 0, 1, 1, 1]);
        let mut booster = AdaBoostClassifier::with_params(Some(5)).unwrap();
        booster.fit(&dataset).unwrap();

        assert_eq!(booster.predict(&dataset.x).unwrap(), dataset.y);
        assert_eq!(booster.estimator_weights().len(), 5);
        // A perfect stump has zero error, so alpha is bounded only by the epsilon guard.
        assert_relative_eq!(
            booster.estimator_weights()[0],
            0.5 * (1.0 / EPSILON).ln(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_single_round_matches_its_stump() {
        let dataset = line(vec![0, 0, 1, 0, 1, 1]);
        let mut booster = AdaBoostClassifier::with_params(Some(1)).unwrap();
        booster.fit(&dataset).unwrap();

        let signed = Dataset::new(
            dataset.x.clone(),
            dataset.y.map(|label| if label == 0 { -1i8 } else { 1i8 }),
        );
        let mut stump = DecisionTreeClassifier::with_params(None, None, Some(1)).unwrap();
        stump.fit(&signed).unwrap();

        let test_x = DMatrix::from_row_slice(8, 1, &[-3.0, 1.0, 2.0, 2.9, 3.0, 4.0, 6.0, 50.0]);
        let expected = stump.predict(&test_x).unwrap().map(i32::from);
        assert_eq!(booster.predict(&test_x).unwrap(), expected);

        // One mistake out of six rows.
        assert_relative_eq!(
            booster.estimator_weights()[0],
            0.5 * ((5.0 / 6.0) / (1.0 / 6.0 + EPSILON)).ln(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_noisy_data_keeps_weights_finite() {
        let dataset = line(vec![0, 1, 0, 1, 1, 0, 1, 0, 0, 1]);
        let mut booster = AdaBoostClassifier::with_params(Some(20)).unwrap();
        booster.fit(&dataset).unwrap();

        assert!(booster.estimator_weights().iter().all(|alpha| alpha.is_finite()));
        let scores = booster.decision_function(&dataset.x).unwrap();
        assert!(scores.iter().all(|score| score.is_finite()));
    }

    #[test]
    fn test_nonzero_labels_are_positive() {
        let dataset = line(vec![0, 0, 2, 2]);
        let mut booster = AdaBoostClassifier::with_params(Some(3)).unwrap();
        booster.fit(&dataset).unwrap();
        assert_eq!(
            booster.predict(&dataset.x).unwrap(),
            DVector::from_vec(vec![0, 0, 1, 1])
        );
    }

    #[test]
    fn test_zero_score_maps_to_zero() {
        let dataset = line(vec![0, 1]);
        let signed = Dataset::new(dataset.x.clone(), DVector::from_vec(vec![-1i8, 1]));
        let mut stump = DecisionTreeClassifier::with_params(None, None, Some(1)).unwrap();
        stump.fit(&signed).unwrap();

        let booster = AdaBoostClassifier::<f64, i32> {
            estimators: vec![stump],
            estimator_weights: vec![0.0],
            boosting_params: BoostingParams::new(),
            _marker: PhantomData,
        };
        assert_eq!(
            booster.decision_function(&dataset.x).unwrap(),
            DVector::from_vec(vec![0.0, 0.0])
        );
        assert_eq!(booster.predict(&dataset.x).unwrap(), DVector::from_vec(vec![0, 0]));
    }

    #[test]
    fn test_predict_is_stable() {
        let dataset = line(vec![1, 0, 0, 1, 1, 0, 1]);
        let mut booster = AdaBoostClassifier::with_params(Some(4)).unwrap();
        booster.fit(&dataset).unwrap();
        assert_eq!(
            booster.predict(&dataset.x).unwrap(),
            booster.predict(&dataset.x).unwrap()
        );
    }

    #[test]
    fn test_visualization_data() {
        let mut booster = AdaBoostClassifier::<f64, i32>::with_params(Some(3)).unwrap();
        assert!(booster.visualization_data().is_none());

        booster.fit(&line(vec![0, 0, 1, 1])).unwrap();
        let data = booster.visualization_data().unwrap();
        assert_eq!(data.n_estimators, 3);
        assert_eq!(data.estimator_count, 3);
        assert_eq!(data.estimator_weights, booster.estimator_weights().to_vec());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["estimator_weights"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_reweight_keeps_weights_positive() {
        let truth = DVector::from_vec(vec![1i8, 1, -1, -1]);
        let predictions = DVector::from_vec(vec![1i8, 1, -1, 1]);
        let mut weights = vec![0.25; 4];

        reweight(&mut weights, &predictions, &truth, 40.0);

        // exp(-40) would underflow the correct rows far below the floor.
        assert!(weights.iter().all(|weight| *weight > 0.0));
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(weights[3] > weights[0]);
        assert_relative_eq!(weights[0], weights[1]);
        assert_relative_eq!(weights[0], weights[2]);
    }

    #[test]
    fn test_weighted_error() {
        let truth = DVector::from_vec(vec![1i8, -1, 1, -1]);
        let half_wrong = DVector::from_vec(vec![1i8, -1, -1, 1]);
        assert_relative_eq!(
            weighted_error(&[0.1, 0.2, 0.3, 0.4], &half_wrong, &truth),
            0.7,
            epsilon = 1e-12
        );

        let all_wrong = truth.map(|label| -label);
        let error = weighted_error(&[0.25; 4], &all_wrong, &truth);
        assert_eq!(error, 1.0 - EPSILON);
        let alpha = 0.5 * ((1.0 - error) / (error + EPSILON)).ln();
        assert!(alpha.is_finite() && alpha < 0.0);
    }

    #[test]
    fn test_errors() {
        let booster = AdaBoostClassifier::<f64, i32>::new();
        assert!(matches!(
            booster.predict(&DMatrix::zeros(2, 1)),
            Err(ModelError::NotTrained)
        ));

        let mut booster = AdaBoostClassifier::<f64, i32>::new();
        let empty = Dataset::new(DMatrix::zeros(0, 1), DVector::zeros(0));
        assert!(matches!(booster.fit(&empty), Err(ModelError::Validation(_))));
        assert!(AdaBoostClassifier::<f64, i32>::with_params(Some(0)).is_err());
    }
}
