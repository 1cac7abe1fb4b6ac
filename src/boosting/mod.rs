/// AdaBoost classifier
pub mod classifier;
pub mod params;
