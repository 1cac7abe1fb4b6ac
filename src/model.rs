use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use serde_json::Value;

use crate::{
    boosting::classifier::AdaBoostClassifier,
    data::dataset::{Dataset, Number, WholeNumber},
    error::ModelError,
    forests::classifier::RandomForestClassifier,
    metrics::confusion::ClassificationMetrics,
    trees::classifier::DecisionTreeClassifier,
};

/// Common surface of every classifier in the crate.
///
/// Lets callers pick an algorithm at runtime (see [`crate::config::ModelConfig`]) and drive it
/// through a `Box<dyn Classifier<XT, YT>>`.
pub trait Classifier<XT: Number, YT: WholeNumber>: ClassificationMetrics<YT> {
    /// Trains the model. Deterministic models ignore `rng`.
    fn train(&mut self, dataset: &Dataset<XT, YT>, rng: &mut dyn RngCore) -> Result<(), ModelError>;

    fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError>;

    /// JSON description of the trained model, `None` before training.
    fn visualization_data(&self) -> Result<Option<Value>, ModelError>;

    /// Accuracy of the model's predictions on `dataset`.
    fn evaluate(&self, dataset: &Dataset<XT, YT>) -> Result<f64, ModelError> {
        let predictions = self.predict(&dataset.x)?;
        self.accuracy(&dataset.y, &predictions)
    }
}

fn to_json<T: serde::Serialize>(data: Option<T>) -> Result<Option<Value>, ModelError> {
    data.map(serde_json::to_value)
        .transpose()
        .map_err(ModelError::from)
}

impl<XT: Number, YT: WholeNumber> Classifier<XT, YT> for DecisionTreeClassifier<XT, YT> {
    fn train(&mut self, dataset: &Dataset<XT, YT>, _rng: &mut dyn RngCore) -> Result<(), ModelError> {
        self.fit(dataset)
    }

    fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        DecisionTreeClassifier::predict(self, features)
    }

    fn visualization_data(&self) -> Result<Option<Value>, ModelError> {
        to_json(DecisionTreeClassifier::visualization_data(self))
    }
}

impl<XT: Number, YT: WholeNumber> Classifier<XT, YT> for RandomForestClassifier<XT, YT> {
    fn train(&mut self, dataset: &Dataset<XT, YT>, rng: &mut dyn RngCore) -> Result<(), ModelError> {
        self.fit_with_rng(dataset, rng)
    }

    fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        RandomForestClassifier::predict(self, features)
    }

    fn visualization_data(&self) -> Result<Option<Value>, ModelError> {
        to_json(RandomForestClassifier::visualization_data(self))
    }
}

impl<XT: Number, YT: WholeNumber> Classifier<XT, YT> for AdaBoostClassifier<XT, YT> {
    fn train(&mut self, dataset: &Dataset<XT, YT>, _rng: &mut dyn RngCore) -> Result<(), ModelError> {
        self.fit(dataset)
    }

    fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        AdaBoostClassifier::predict(self, features)
    }

    fn visualization_data(&self) -> Result<Option<Value>, ModelError> {
        to_json(AdaBoostClassifier::visualization_data(self))
    }
}
