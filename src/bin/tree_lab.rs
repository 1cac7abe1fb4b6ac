use csv::ReaderBuilder;
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, SeedableRng};
use rusty_ensembles::config::ModelConfig;
use rusty_ensembles::data::dataset::Dataset;
use std::collections::HashMap;
use std::error::Error;
use std::{env, fs, process};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: tree-lab <dataset.csv> <config.json> [seed]";

/// Reads a headered CSV whose last column is the class label.
///
/// Labels are mapped to ids in order of first appearance.
fn read_file_classification(file_path: &str) -> Result<Dataset<f64, u32>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(file_path)?;
    let mut features = Vec::new();
    let mut labels = Vec::new();
    let mut label_map = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let dimension = record
            .len()
            .checked_sub(1)
            .filter(|&dimension| dimension > 0)
            .ok_or("Each row needs at least one feature and a label")?;

        let mut feature_row = Vec::with_capacity(dimension);
        for feature in record.iter().take(dimension) {
            feature_row.push(feature.trim().parse::<f64>()?);
        }

        let label = record.get(dimension).ok_or("Missing label")?;
        let next_id = label_map.len() as u32;
        let label_id = *label_map
            .entry(label.trim().to_string())
            .or_insert(next_id);

        features.push(feature_row);
        labels.push(label_id);
    }

    let num_features = features
        .first()
        .map(Vec::len)
        .ok_or("The dataset has no rows")?;
    let feature_matrix = DMatrix::from_row_slice(features.len(), num_features, &features.concat());
    let label_vector = DVector::from_vec(labels);

    Ok(Dataset::new(feature_matrix, label_vector))
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let (dataset_path, config_path) = match args.as_slice() {
        [_, dataset_path, config_path, ..] => (dataset_path, config_path),
        _ => return Err(USAGE.into()),
    };
    let seed = args.get(3).map(|seed| seed.parse::<u64>()).transpose()?;

    let dataset = read_file_classification(dataset_path)?;
    let config = ModelConfig::from_json(&fs::read_to_string(config_path)?)?;
    let mut model = config.build::<f64, u32>()?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        algorithm = config.algorithm_id(),
        rows = dataset.nrows(),
        features = dataset.ncols(),
        "Training model."
    );
    model.train(&dataset, &mut rng)?;
    let accuracy = model.evaluate(&dataset)?;
    info!(accuracy, "Training accuracy: {}%", accuracy * 100.0);

    if let Some(data) = model.visualization_data()? {
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        error!("{err}");
        process::exit(1);
    }
}
