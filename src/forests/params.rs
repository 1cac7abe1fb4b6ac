use crate::{
    error::ModelError,
    trees::{impurity::Criterion, params::TreeClassifierParams},
};

/// Default depth limit of every tree grown by a forest.
pub const DEFAULT_FOREST_MAX_DEPTH: u16 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct ForestParams {
    num_trees: usize,
    max_features: Option<usize>,
    bootstrap: bool,
    tree_params: TreeClassifierParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestParams {
    pub fn new() -> Self {
        let mut tree_params = TreeClassifierParams::new();
        tree_params.base_params.max_depth = Some(DEFAULT_FOREST_MAX_DEPTH);
        Self {
            num_trees: 10,
            max_features: None,
            bootstrap: true,
            tree_params,
        }
    }

    pub fn set_num_trees(&mut self, num_trees: usize) -> Result<(), ModelError> {
        if num_trees < 1 {
            return Err(ModelError::validation(
                "The number of trees must be greater than 0.",
            ));
        }
        self.num_trees = num_trees;
        Ok(())
    }

    /// Number of features drawn for each tree. `None` draws `ceil(sqrt(n_features))`.
    pub fn set_max_features(&mut self, max_features: Option<usize>) -> Result<(), ModelError> {
        if max_features.is_some_and(|size| size < 1) {
            return Err(ModelError::validation(
                "The number of features per tree must be greater than 0.",
            ));
        }
        self.max_features = max_features;
        Ok(())
    }

    /// When disabled every tree is trained on the full set of rows.
    pub fn set_bootstrap(&mut self, bootstrap: bool) {
        self.bootstrap = bootstrap;
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: u16) -> Result<(), ModelError> {
        self.tree_params.set_min_samples_split(min_samples_split)
    }

    pub fn set_max_depth(&mut self, max_depth: Option<u16>) -> Result<(), ModelError> {
        self.tree_params.set_max_depth(max_depth)
    }

    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.tree_params.set_criterion(criterion)
    }

    pub fn num_trees(&self) -> usize {
        self.num_trees
    }

    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    pub fn bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.tree_params.max_depth()
    }

    pub fn tree_params(&self) -> &TreeClassifierParams {
        &self.tree_params
    }

    /// Features drawn per tree out of `num_features` available.
    pub fn subset_size(&self, num_features: usize) -> usize {
        match self.max_features {
            Some(max_features) => max_features.min(num_features),
            None => (num_features as f64).sqrt().ceil() as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ForestParams::new();
        assert_eq!(params.num_trees(), 10);
        assert_eq!(params.max_depth(), Some(DEFAULT_FOREST_MAX_DEPTH));
        assert_eq!(params.max_features(), None);
        assert!(params.bootstrap());
    }

    #[test]
    fn test_rejects_zero_trees() {
        let mut params = ForestParams::new();
        assert!(params.set_num_trees(0).is_err());
        assert!(params.set_num_trees(1).is_ok());
        assert_eq!(params.num_trees(), 1);
    }

    #[test]
    fn test_subset_size() {
        let mut params = ForestParams::new();
        assert_eq!(params.subset_size(4), 2);
        assert_eq!(params.subset_size(5), 3);
        assert_eq!(params.subset_size(1), 1);

        params.set_max_features(Some(10)).unwrap();
        assert_eq!(params.subset_size(4), 4);
        assert!(params.set_max_features(Some(0)).is_err());
    }
}
