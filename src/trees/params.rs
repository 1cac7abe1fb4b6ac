use super::impurity::Criterion;
use crate::error::ModelError;

/// Default depth limit of a standalone decision tree.
pub const DEFAULT_MAX_DEPTH: u16 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
    pub min_samples_split: u16,
    pub max_depth: Option<u16>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeParams {
    pub fn new() -> Self {
        Self {
            min_samples_split: 2,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: u16) -> Result<(), ModelError> {
        if min_samples_split < 2 {
            return Err(ModelError::validation(
                "The minimum number of samples to split must be greater than 1.",
            ));
        }
        self.min_samples_split = min_samples_split;
        Ok(())
    }

    /// `None` lets the tree grow until every leaf is pure or unsplittable.
    pub fn set_max_depth(&mut self, max_depth: Option<u16>) -> Result<(), ModelError> {
        if max_depth.is_some_and(|depth| depth < 1) {
            return Err(ModelError::validation(
                "The maximum depth must be greater than 0.",
            ));
        }
        self.max_depth = max_depth;
        Ok(())
    }

    pub fn min_samples_split(&self) -> u16 {
        self.min_samples_split
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.max_depth
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeClassifierParams {
    pub base_params: TreeParams,
    pub criterion: Criterion,
}

impl TreeClassifierParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: u16) -> Result<(), ModelError> {
        self.base_params.set_min_samples_split(min_samples_split)
    }

    pub fn set_max_depth(&mut self, max_depth: Option<u16>) -> Result<(), ModelError> {
        self.base_params.set_max_depth(max_depth)
    }

    pub fn set_criterion(&mut self, criterion: Criterion) {
        self.criterion = criterion;
    }

    pub fn min_samples_split(&self) -> u16 {
        self.base_params.min_samples_split
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.base_params.max_depth
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }
}
