//! Decision Tree Classifier
use super::{
    impurity::{majority_vote, Criterion},
    node::{TreeNode, TreeVisualization},
    params::TreeClassifierParams,
    split::find_best_split,
};
use crate::{
    data::dataset::{Dataset, Number, WholeNumber},
    error::ModelError,
    metrics::confusion::ClassificationMetrics,
};
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Decision Tree Classifier
///
/// Grows a binary tree by exhaustive search over every distinct value of every feature.
/// Rows with `value < threshold` are routed left.
#[derive(Clone, Debug)]
pub struct DecisionTreeClassifier<XT: Number, YT: WholeNumber> {
    root: Option<Box<TreeNode<XT, YT>>>,
    tree_params: TreeClassifierParams,
    num_features: usize,
}

impl<XT: Number, YT: WholeNumber> Default for DecisionTreeClassifier<XT, YT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<XT: Number, YT: WholeNumber> ClassificationMetrics<YT> for DecisionTreeClassifier<XT, YT> {}

impl<XT: Number, YT: WholeNumber> DecisionTreeClassifier<XT, YT> {
    /// Creates a tree with the gini criterion, `min_samples_split = 2` and `max_depth = 5`.
    pub fn new() -> Self {
        Self::from_params(TreeClassifierParams::new())
    }

    pub fn from_params(tree_params: TreeClassifierParams) -> Self {
        Self {
            root: None,
            tree_params,
            num_features: 0,
        }
    }

    /// Creates a new instance of the decision tree classifier with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `criterion` - The impurity measure used to score splits.
    /// * `min_samples_split` - The minimum number of samples required to split an internal node.
    /// * `max_depth` - The maximum depth of the tree.
    ///
    /// Arguments left as `None` keep their defaults.
    ///
    /// # Errors
    ///
    /// This method will return an error if the minimum number of samples to split is less than 2 or if the maximum depth is less than 1.
    pub fn with_params(
        criterion: Option<Criterion>,
        min_samples_split: Option<u16>,
        max_depth: Option<u16>,
    ) -> Result<Self, ModelError> {
        let mut tree = Self::new();

        tree.set_criterion(criterion.unwrap_or_default());
        tree.set_min_samples_split(min_samples_split.unwrap_or(2))?;
        if max_depth.is_some() {
            tree.set_max_depth(max_depth)?;
        }
        Ok(tree)
    }

    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.tree_params.set_criterion(criterion)
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: u16) -> Result<(), ModelError> {
        self.tree_params.set_min_samples_split(min_samples_split)
    }

    /// Sets the maximum depth of the tree. `None` removes the limit.
    pub fn set_max_depth(&mut self, max_depth: Option<u16>) -> Result<(), ModelError> {
        self.tree_params.set_max_depth(max_depth)
    }

    pub fn criterion(&self) -> Criterion {
        self.tree_params.criterion()
    }

    pub fn min_samples_split(&self) -> u16 {
        self.tree_params.min_samples_split()
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.tree_params.max_depth()
    }

    pub fn is_trained(&self) -> bool {
        self.root.is_some()
    }

    /// Builds the decision tree from a dataset.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the dataset is empty or has a different number of rows and labels.
    /// On error the previously trained tree, if any, is left untouched.
    pub fn fit(&mut self, dataset: &Dataset<XT, YT>) -> Result<(), ModelError> {
        self.fit_weighted(dataset, None)
    }

    /// Builds the decision tree, accepting per-sample weights.
    ///
    /// The weights are validated but do not influence split selection: every row counts
    /// once in the impurity computation. Ensembles that reweight samples measure their
    /// error with the weights themselves.
    pub fn fit_weighted(
        &mut self,
        dataset: &Dataset<XT, YT>,
        sample_weights: Option<&[f64]>,
    ) -> Result<(), ModelError> {
        dataset.validate()?;
        if let Some(weights) = sample_weights {
            validate_weights(weights, dataset.nrows())?;
            debug!("Sample weights received; split search stays unweighted.");
        }

        let labels = canonical_labels(&dataset.y);
        let canonical = Dataset::new(dataset.x.clone(), labels);
        let root = self.build_tree(&canonical, 0)?;

        info!(
            depth = root.depth(),
            nodes = root.node_count(),
            criterion = %self.criterion(),
            "Finished building the tree."
        );
        self.num_features = dataset.ncols();
        self.root = Some(Box::new(root));
        Ok(())
    }

    /// Predicts the labels for new data.
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` before `fit`, and a validation error if `features` has a
    /// different number of columns than the training data.
    pub fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        let root = self.root.as_ref().ok_or(ModelError::NotTrained)?;
        if features.ncols() != self.num_features {
            return Err(ModelError::validation(format!(
                "Expected {} features, got {}.",
                self.num_features,
                features.ncols()
            )));
        }
        let predictions: Vec<_> = features
            .row_iter()
            .map(|row| root.predict(&row.transpose()))
            .collect();

        Ok(DVector::from_vec(predictions))
    }

    /// Recursive description of the trained tree, `None` before `fit`.
    pub fn visualization_data(&self) -> Option<TreeVisualization<XT, YT>> {
        self.root.as_ref().map(|root| root.visualize(0))
    }

    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(|root| root.depth())
    }

    pub fn node_count(&self) -> Option<usize> {
        self.root.as_ref().map(|root| root.node_count())
    }

    /// Impurity-decrease importance of every training feature, normalised to sum to 1.
    ///
    /// A tree consisting of a single leaf yields all zeros.
    pub fn feature_importances(&self) -> Option<DVector<f64>> {
        let root = self.root.as_ref()?;
        let root_samples = match &**root {
            TreeNode::Internal { num_samples, .. } => *num_samples,
            TreeNode::Leaf { .. } => 1,
        };
        let mut importances = vec![0.0; self.num_features];
        root.accumulate_importances(&mut importances, root_samples);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|value| *value /= total);
        }
        Some(DVector::from_vec(importances))
    }

    fn build_tree(
        &self,
        dataset: &Dataset<XT, YT>,
        current_depth: u16,
    ) -> Result<TreeNode<XT, YT>, ModelError> {
        let (x, y) = dataset.into_parts();
        let labels = y.as_slice();
        let num_samples = labels.len();

        let leaf = |labels: &[YT]| {
            majority_vote(labels)
                .map(TreeNode::<XT, YT>::leaf)
                .ok_or_else(|| ModelError::validation("Can't build a leaf from an empty node."))
        };

        let depth_reached = self
            .max_depth()
            .is_some_and(|max_depth| current_depth >= max_depth);
        let is_pure = labels.iter().all(|label| *label == labels[0]);
        if depth_reached || num_samples < usize::from(self.min_samples_split()) || is_pure {
            return leaf(labels);
        }

        let criterion = self.criterion();
        let Some(best_split) = find_best_split(x, labels, criterion.impurity(labels), criterion)
        else {
            return leaf(labels);
        };

        let (left_child, right_child) =
            dataset.split_on_threshold(best_split.feature_index, best_split.threshold);
        let left_node = self.build_tree(&left_child, current_depth + 1)?;
        let right_node = self.build_tree(&right_child, current_depth + 1)?;

        Ok(TreeNode::Internal {
            feature_index: best_split.feature_index,
            threshold: best_split.threshold,
            information_gain: best_split.information_gain,
            num_samples,
            left: Box::new(left_node),
            right: Box::new(right_node),
        })
    }
}

/// Maps labels drawn exactly from {-1, +1} onto {0, 1}; any other label set is returned as is.
pub(crate) fn canonical_labels<YT: WholeNumber>(y: &DVector<YT>) -> DVector<YT> {
    let (Some(negative), Some(positive)) = (YT::from_i8(-1), YT::from_i8(1)) else {
        return y.clone();
    };
    let distinct: BTreeSet<YT> = y.iter().cloned().collect();
    if distinct != BTreeSet::from([negative, positive]) {
        return y.clone();
    }
    y.map(|label| {
        if label == negative {
            YT::zero()
        } else {
            YT::one()
        }
    })
}

fn validate_weights(weights: &[f64], num_samples: usize) -> Result<(), ModelError> {
    if weights.len() != num_samples {
        return Err(ModelError::validation(format!(
            "Expected {} sample weights, got {}.",
            num_samples,
            weights.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ModelError::validation(
            "Sample weights must be finite and non-negative.",
        ));
    }
    Ok(())
}
