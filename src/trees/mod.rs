/// Decision tree classifier
pub mod classifier;
/// Gini and entropy impurity measures
pub mod impurity;
pub mod node;
pub mod params;
/// Best split search
pub mod split;
