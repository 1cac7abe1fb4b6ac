/// Random forest classifier
pub mod classifier;
pub mod params;
