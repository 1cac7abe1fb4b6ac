use serde::{Deserialize, Serialize};

use crate::{
    boosting::classifier::AdaBoostClassifier,
    data::dataset::{Number, WholeNumber},
    error::ModelError,
    forests::classifier::RandomForestClassifier,
    model::Classifier,
    trees::{classifier::DecisionTreeClassifier, impurity::Criterion},
};

/// Algorithm choice plus hyperparameters, as read from JSON.
///
/// Omitted hyperparameters keep the model's defaults.
///
/// ```json
/// { "algorithm": "random_forest", "n_trees": 25, "max_depth": 8 }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum ModelConfig {
    DecisionTree {
        criterion: Option<String>,
        max_depth: Option<u16>,
        min_samples_split: Option<u16>,
    },
    RandomForest {
        n_trees: Option<usize>,
        criterion: Option<String>,
        max_depth: Option<u16>,
        min_samples_split: Option<u16>,
        /// Features drawn per tree.
        n_features: Option<usize>,
        bootstrap: Option<bool>,
    },
    #[serde(rename = "adaboost")]
    AdaBoost { n_estimators: Option<usize> },
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn algorithm_id(&self) -> &'static str {
        match self {
            Self::DecisionTree { .. } => "decision_tree",
            Self::RandomForest { .. } => "random_forest",
            Self::AdaBoost { .. } => "adaboost",
        }
    }

    /// Creates the untrained model described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown criterion or an out-of-range hyperparameter.
    pub fn build<XT: Number, YT: WholeNumber>(
        &self,
    ) -> Result<Box<dyn Classifier<XT, YT>>, ModelError> {
        match self {
            Self::DecisionTree {
                criterion,
                max_depth,
                min_samples_split,
            } => {
                let tree = DecisionTreeClassifier::<XT, YT>::with_params(
                    parse_criterion(criterion.as_deref())?,
                    *min_samples_split,
                    *max_depth,
                )?;
                Ok(Box::new(tree))
            }
            Self::RandomForest {
                n_trees,
                criterion,
                max_depth,
                min_samples_split,
                n_features,
                bootstrap,
            } => {
                let mut forest = RandomForestClassifier::<XT, YT>::new();
                let params = forest.params_mut();
                if let Some(n_trees) = n_trees {
                    params.set_num_trees(*n_trees)?;
                }
                if let Some(criterion) = parse_criterion(criterion.as_deref())? {
                    params.set_criterion(criterion);
                }
                if max_depth.is_some() {
                    params.set_max_depth(*max_depth)?;
                }
                if let Some(min_samples_split) = min_samples_split {
                    params.set_min_samples_split(*min_samples_split)?;
                }
                params.set_max_features(*n_features)?;
                if let Some(bootstrap) = bootstrap {
                    params.set_bootstrap(*bootstrap);
                }
                Ok(Box::new(forest))
            }
            Self::AdaBoost { n_estimators } => {
                Ok(Box::new(AdaBoostClassifier::<XT, YT>::with_params(
                    *n_estimators,
                )?))
            }
        }
    }
}

fn parse_criterion(name: Option<&str>) -> Result<Option<Criterion>, ModelError> {
    name.map(str::parse).transpose()
}
