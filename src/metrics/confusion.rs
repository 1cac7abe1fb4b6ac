use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};

use crate::{data::dataset::WholeNumber, error::ModelError};

type ConfusionMatrix = DMatrix<usize>;

pub trait ClassificationMetrics<T: WholeNumber> {
    /// Computes the confusion matrix based on the true labels and predicted labels.
    ///
    /// Rows follow the true labels and columns the predicted labels, both in ascending
    /// label order over every label seen in either vector.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the vectors are empty or of different sizes.
    fn confusion_matrix(
        &self,
        y_true: &DVector<T>,
        y_pred: &DVector<T>,
    ) -> Result<ConfusionMatrix, ModelError> {
        if y_true.len() != y_pred.len() {
            return Err(ModelError::validation(
                "Predictions and labels are of different sizes.",
            ));
        }
        if y_true.is_empty() {
            return Err(ModelError::validation("There are no labels to compare."));
        }

        let classes: Vec<T> = y_true
            .iter()
            .chain(y_pred.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut matrix = DMatrix::zeros(classes.len(), classes.len());

        for (y_t, y_p) in y_true.iter().zip(y_pred.iter()) {
            if let (Ok(matrix_row), Ok(matrix_col)) =
                (classes.binary_search(y_t), classes.binary_search(y_p))
            {
                matrix[(matrix_row, matrix_col)] += 1;
            }
        }

        Ok(matrix)
    }

    /// Computes the fraction of predictions equal to the true label.
    fn accuracy(&self, y_true: &DVector<T>, y_pred: &DVector<T>) -> Result<f64, ModelError> {
        let matrix = self.confusion_matrix(y_true, y_pred)?;

        let correct: usize = matrix.diagonal().iter().sum();

        Ok(correct as f64 / y_true.len() as f64)
    }
}
