use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::params::ForestParams;
use crate::{
    data::dataset::{Dataset, Number, WholeNumber},
    error::ModelError,
    metrics::confusion::ClassificationMetrics,
    trees::{
        classifier::{canonical_labels, DecisionTreeClassifier},
        impurity::majority_vote,
    },
};

/// Number of trees summarised in the visualization data.
const SAMPLE_TREES: usize = 3;

#[derive(Clone, Debug)]
struct ForestMember<XT: Number, YT: WholeNumber> {
    tree: DecisionTreeClassifier<XT, YT>,
    /// Sorted indices of the training columns this tree sees.
    feature_indices: Vec<usize>,
}

/// Summary of one member tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeSummary {
    pub depth: usize,
    pub node_count: usize,
    pub feature_indices: Vec<usize>,
    /// Importance keyed by training column index.
    pub feature_importance: BTreeMap<usize, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ForestVisualization {
    pub n_trees: usize,
    pub sample_trees: Vec<TreeSummary>,
    pub max_depth: Option<u16>,
    /// Features drawn for every tree.
    pub n_features: usize,
}

/// Random forest classifier.
///
/// Every tree is trained on a bootstrap sample of the rows restricted to a random subset of
/// the columns; predictions are combined by majority vote, ties going to the lowest label.
#[derive(Clone, Debug)]
pub struct RandomForestClassifier<XT: Number, YT: WholeNumber> {
    members: Vec<ForestMember<XT, YT>>,
    forest_params: ForestParams,
    num_features: usize,
    features_per_tree: usize,
}

impl<XT: Number, YT: WholeNumber> Default for RandomForestClassifier<XT, YT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<XT: Number, YT: WholeNumber> ClassificationMetrics<YT> for RandomForestClassifier<XT, YT> {}

impl<XT: Number, YT: WholeNumber> RandomForestClassifier<XT, YT> {
    pub fn new() -> Self {
        Self::from_params(ForestParams::new())
    }

    pub fn from_params(forest_params: ForestParams) -> Self {
        Self {
            members: Vec::new(),
            forest_params,
            num_features: 0,
            features_per_tree: 0,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.forest_params
    }

    pub fn params_mut(&mut self) -> &mut ForestParams {
        &mut self.forest_params
    }

    pub fn is_trained(&self) -> bool {
        !self.members.is_empty()
    }

    /// Trees with the columns each of them was trained on.
    pub fn members(&self) -> impl Iterator<Item = (&DecisionTreeClassifier<XT, YT>, &[usize])> {
        self.members
            .iter()
            .map(|member| (&member.tree, member.feature_indices.as_slice()))
    }

    /// Trains the forest, seeding the generator from `seed` or from system entropy.
    pub fn fit(&mut self, dataset: &Dataset<XT, YT>, seed: Option<u64>) -> Result<(), ModelError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            _ => StdRng::from_entropy(),
        };
        self.fit_with_rng(dataset, &mut rng)
    }

    /// Trains the forest drawing all randomness from `rng`.
    ///
    /// One seed per tree is drawn up front, so the trees come out the same whether they are
    /// grown sequentially or on the rayon pool.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the dataset is empty or inconsistent. On error the
    /// previously trained forest, if any, is left untouched.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &mut self,
        dataset: &Dataset<XT, YT>,
        rng: &mut R,
    ) -> Result<(), ModelError> {
        dataset.validate()?;
        // Members must agree on the label domain even when a bootstrap sample holds one class.
        let dataset = &Dataset::new(dataset.x.clone(), canonical_labels(&dataset.y));
        let num_features = dataset.ncols();
        let features_per_tree = self.forest_params.subset_size(num_features);

        let seeds = (0..self.forest_params.num_trees())
            .map(|_| rng.gen::<u64>())
            .collect::<Vec<_>>();

        #[cfg(feature = "parallel")]
        let seeds = seeds.into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let seeds = seeds.into_iter();

        let members = seeds
            .map(|tree_seed| self.grow_member(dataset, features_per_tree, tree_seed))
            .collect::<Result<Vec<_>, ModelError>>()?;

        info!(
            trees = members.len(),
            features_per_tree, "Finished building the forest."
        );
        self.members = members;
        self.num_features = num_features;
        self.features_per_tree = features_per_tree;
        Ok(())
    }

    fn grow_member(
        &self,
        dataset: &Dataset<XT, YT>,
        features_per_tree: usize,
        tree_seed: u64,
    ) -> Result<ForestMember<XT, YT>, ModelError> {
        let mut rng = StdRng::seed_from_u64(tree_seed);

        let mut feature_indices =
            index::sample(&mut rng, dataset.ncols(), features_per_tree).into_vec();
        feature_indices.sort_unstable();

        let subset = if self.forest_params.bootstrap() {
            dataset.bootstrap(&mut rng).select_columns(&feature_indices)
        } else {
            dataset.select_columns(&feature_indices)
        };

        let mut tree = DecisionTreeClassifier::from_params(self.forest_params.tree_params().clone());
        tree.fit(&subset)?;
        debug!(?feature_indices, depth = ?tree.depth(), "Grew forest member.");

        Ok(ForestMember {
            tree,
            feature_indices,
        })
    }

    /// Predicts by majority vote over all trees; ties go to the lowest label.
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` before `fit`, and a validation error if `features` has a
    /// different number of columns than the training data.
    pub fn predict(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, ModelError> {
        if self.members.is_empty() {
            return Err(ModelError::NotTrained);
        }
        if features.ncols() != self.num_features {
            return Err(ModelError::validation(format!(
                "Expected {} features, got {}.",
                self.num_features,
                features.ncols()
            )));
        }

        let member_predictions = self
            .members
            .iter()
            .map(|member| {
                member
                    .tree
                    .predict(&features.select_columns(&member.feature_indices))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let predictions = (0..features.nrows())
            .map(|row| {
                let votes: Vec<YT> = member_predictions.iter().map(|p| p[row]).collect();
                majority_vote(&votes).ok_or(ModelError::NotTrained)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DVector::from_vec(predictions))
    }

    /// Mean of the member importances, mapped back onto the training columns.
    pub fn feature_importances(&self) -> Option<DVector<f64>> {
        if self.members.is_empty() {
            return None;
        }
        let mut importances = DVector::<f64>::zeros(self.num_features);
        for member in &self.members {
            if let Some(tree_importances) = member.tree.feature_importances() {
                for (local, &feature) in member.feature_indices.iter().enumerate() {
                    importances[feature] += tree_importances[local];
                }
            }
        }
        Some(importances / self.members.len() as f64)
    }

    /// Summary of the forest and of its first few trees, `None` before `fit`.
    pub fn visualization_data(&self) -> Option<ForestVisualization> {
        if self.members.is_empty() {
            return None;
        }
        let sample_trees = self
            .members
            .iter()
            .take(SAMPLE_TREES)
            .map(|member| {
                let feature_importance: BTreeMap<usize, f64> = member
                    .tree
                    .feature_importances()
                    .map(|importances| {
                        member
                            .feature_indices
                            .iter()
                            .zip(importances.iter())
                            .map(|(&feature, &importance)| (feature, importance))
                            .collect()
                    })
                    .unwrap_or_default();
                TreeSummary {
                    depth: member.tree.depth().unwrap_or_default(),
                    node_count: member.tree.node_count().unwrap_or_default(),
                    feature_indices: member.feature_indices.clone(),
                    feature_importance,
                }
            })
            .collect();

        Some(ForestVisualization {
            n_trees: self.members.len(),
            sample_trees,
            max_depth: self.forest_params.max_depth(),
            n_features: self.features_per_tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> Dataset<f64, i32> {
        let x = DMatrix::from_row_slice(
            10,
            2,
            &[
                0.0, 0.5, 0.2, 0.1, 0.4, 0.9, 0.6, 0.3, 0.8, 0.7, //
                10.0, 10.5, 10.2, 10.1, 10.4, 10.9, 10.6, 10.3, 10.8, 10.7,
            ],
        );
        let y = DVector::from_vec(vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        Dataset::new(x, y)
    }

    #[test]
    fn test_fit_and_predict_clusters() {
        let mut forest = RandomForestClassifier::new();
        forest.params_mut().set_num_trees(15).unwrap();
        forest.fit(&clusters(), Some(42)).unwrap();

        let test_x = DMatrix::from_row_slice(2, 2, &[0.3, 0.4, 11.0, 11.0]);
        assert_eq!(forest.predict(&test_x).unwrap(), DVector::from_vec(vec![0, 1]));
    }

    #[test]
    fn test_single_tree_without_bootstrap_matches_decision_tree() {
        let dataset = Dataset::new(
            DMatrix::from_row_slice(6, 2, &[1.0, 5.0, 2.0, 4.0, 3.0, 3.0, 4.0, 2.0, 5.0, 1.0, 6.0, 0.0]),
            DVector::from_vec(vec![0, 0, 1, 2, 2, 1]),
        );
        let mut forest = RandomForestClassifier::new();
        forest.params_mut().set_num_trees(1).unwrap();
        forest.params_mut().set_max_features(Some(2)).unwrap();
        forest.params_mut().set_bootstrap(false);
        forest.fit(&dataset, Some(3)).unwrap();

        let mut tree = DecisionTreeClassifier::with_params(None, None, forest.params().max_depth()).unwrap();
        tree.fit(&dataset).unwrap();

        let test_x = DMatrix::from_row_slice(3, 2, &[1.5, 4.5, 3.5, 2.5, 7.0, -1.0]);
        assert_eq!(forest.predict(&test_x).unwrap(), tree.predict(&test_x).unwrap());
        assert_eq!(forest.predict(&dataset.x).unwrap(), tree.predict(&dataset.x).unwrap());
    }

    #[test]
    fn test_same_seed_same_forest() {
        let dataset = clusters();
        let mut first = RandomForestClassifier::<f64, i32>::new();
        let mut second = RandomForestClassifier::<f64, i32>::new();
        first.fit(&dataset, Some(7)).unwrap();
        second.fit(&dataset, Some(7)).unwrap();

        assert_eq!(first.visualization_data(), second.visualization_data());
        let subsets_first: Vec<_> = first.members().map(|(_, f)| f.to_vec()).collect();
        let subsets_second: Vec<_> = second.members().map(|(_, f)| f.to_vec()).collect();
        assert_eq!(subsets_first, subsets_second);
    }

    #[test]
    fn test_feature_subsets_are_sorted_and_sized() {
        let x = DMatrix::from_fn(8, 9, |row, col| (row * col) as f64);
        let y = DVector::from_fn(8, |row, _| (row % 2) as i32);
        let mut forest = RandomForestClassifier::new();
        forest.fit(&Dataset::new(x, y), Some(11)).unwrap();

        for (_, features) in forest.members() {
            assert_eq!(features.len(), 3);
            assert!(features.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(features.iter().all(|&feature| feature < 9));
        }
    }

    #[test]
    fn test_vote_tie_picks_lowest_label() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let member = |label: i32| {
            let mut tree = DecisionTreeClassifier::new();
            tree.fit(&Dataset::new(x.clone(), DVector::from_vec(vec![label, label])))
                .unwrap();
            ForestMember {
                tree,
                feature_indices: vec![0],
            }
        };
        let forest = RandomForestClassifier {
            members: vec![member(5), member(2)],
            forest_params: ForestParams::new(),
            num_features: 1,
            features_per_tree: 1,
        };
        assert_eq!(forest.predict(&x).unwrap(), DVector::from_vec(vec![2, 2]));
    }

    #[test]
    fn test_visualization_data() {
        let mut forest = RandomForestClassifier::new();
        forest.params_mut().set_num_trees(5).unwrap();
        assert!(forest.visualization_data().is_none());

        forest.fit(&clusters(), Some(1)).unwrap();
        let data = forest.visualization_data().unwrap();
        assert_eq!(data.n_trees, 5);
        assert_eq!(data.sample_trees.len(), SAMPLE_TREES);
        assert_eq!(data.max_depth, Some(10));
        assert_eq!(data.n_features, 2);
        for summary in &data.sample_trees {
            assert_eq!(summary.feature_indices, vec![0, 1]);
            assert_eq!(summary.node_count, 2 * summary.depth + 1);
        }

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["n_trees"], 5);
        assert!(json["sample_trees"][0]["feature_importance"].is_object());
    }

    #[test]
    fn test_feature_importances() {
        let mut forest = RandomForestClassifier::new();
        forest.params_mut().set_bootstrap(false);
        forest.fit(&clusters(), Some(5)).unwrap();
        // Both columns separate the clusters; the first one is always picked.
        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances, DVector::from_vec(vec![1.0, 0.0]));
    }

    #[test]
    fn test_signed_labels_are_remapped_for_every_member() {
        let dataset = Dataset::new(
            DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 10.0, 11.0]),
            DVector::from_vec(vec![-1, -1, 1, 1]),
        );
        // Small bootstrap samples often hold a single class.
        for seed in 0..50 {
            let mut forest = RandomForestClassifier::<f64, i32>::new();
            forest.params_mut().set_num_trees(3).unwrap();
            forest.fit(&dataset, Some(seed)).unwrap();

            for (tree, _) in forest.members() {
                let predictions = tree.predict(&dataset.x).unwrap();
                assert!(predictions.iter().all(|label| *label == 0 || *label == 1));
            }
            let predictions = forest.predict(&dataset.x).unwrap();
            assert!(predictions.iter().all(|label| *label == 0 || *label == 1));
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForestClassifier::<f64, i32>::new();
        assert!(matches!(
            forest.predict(&DMatrix::zeros(1, 2)),
            Err(ModelError::NotTrained)
        ));
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let mut forest = RandomForestClassifier::<f64, i32>::new();
        let empty = Dataset::new(DMatrix::zeros(0, 2), DVector::zeros(0));
        assert!(matches!(
            forest.fit(&empty, Some(0)),
            Err(ModelError::Validation(_))
        ));
        assert!(!forest.is_trained());
    }
}
