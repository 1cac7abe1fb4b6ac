use thiserror::Error;

/// Errors returned by model training, prediction and configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The input data or a hyperparameter was rejected before any work was done.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A model was queried before a successful call to `fit`.
    #[error("The model wasn't trained yet.")]
    NotTrained,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
