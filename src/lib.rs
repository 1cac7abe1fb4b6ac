//! # Rusty-ensembles
//!
//! `rusty-ensembles` provides decision tree classifiers and the two classic ensembles built on
//! top of them: bagged random forests and AdaBoost over decision stumps.
//! Every model can be selected at runtime from a JSON configuration and exposes
//! serialisable data describing what it learned.
//!
//! ## Getting Started
//!
//! To use `rusty-ensembles`, add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! rusty-ensembles = "*"
//! ```
//!
//! Enable the `parallel` feature to grow forest trees on the rayon thread pool.
//!
//! ## Example Usage
//!
//! As a quick example, here's how you can train a decision tree and a random forest on a small dataset:
//!
//! ```rust
//! use nalgebra::{DMatrix, DVector};
//! use rusty_ensembles::data::dataset::Dataset;
//! use rusty_ensembles::forests::classifier::RandomForestClassifier;
//! use rusty_ensembles::trees::classifier::DecisionTreeClassifier;
//!
//! let x = DMatrix::from_row_slice(4, 1, &[2.0, 3.0, 10.0, 11.0]);
//! let y = DVector::from_vec(vec![0, 0, 1, 1]);
//! let dataset = Dataset::new(x, y);
//!
//! let mut tree = DecisionTreeClassifier::with_params(None, None, Some(2)).unwrap();
//! tree.fit(&dataset).unwrap();
//!
//! let test_x = DMatrix::from_row_slice(2, 1, &[2.5, 10.5]);
//! assert_eq!(tree.predict(&test_x).unwrap(), DVector::from_vec(vec![0, 1]));
//!
//! let mut forest = RandomForestClassifier::new();
//! forest.params_mut().set_bootstrap(false);
//! forest.fit(&dataset, Some(42)).unwrap();
//! assert_eq!(forest.predict(&test_x).unwrap(), DVector::from_vec(vec![0, 1]));
//! ```

/// AdaBoost ensembles of decision stumps
pub mod boosting;
/// JSON model configuration
pub mod config;
/// Dataset and data manipulation utilities
pub mod data;
/// Error type shared by every model
pub mod error;
/// Random Forests
pub mod forests;
/// Functions for evaluating model performance
pub mod metrics;
/// Runtime-selectable classifier interface
pub mod model;
/// Decision trees
pub mod trees;
