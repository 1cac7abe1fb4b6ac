use crate::error::ModelError;

#[derive(Clone, Debug, PartialEq)]
pub struct BoostingParams {
    num_estimators: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self::new()
    }
}

impl BoostingParams {
    pub fn new() -> Self {
        Self { num_estimators: 50 }
    }

    pub fn set_num_estimators(&mut self, num_estimators: usize) -> Result<(), ModelError> {
        if num_estimators < 1 {
            return Err(ModelError::validation(
                "The number of estimators must be greater than 0.",
            ));
        }
        self.num_estimators = num_estimators;
        Ok(())
    }

    pub fn num_estimators(&self) -> usize {
        self.num_estimators
    }
}
