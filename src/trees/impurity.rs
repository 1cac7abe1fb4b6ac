//! Impurity measures and majority voting over class labels.
use crate::{data::dataset::WholeNumber, error::ModelError};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Impurity measure used to score candidate splits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl Criterion {
    pub fn impurity<T: WholeNumber>(&self, labels: &[T]) -> f64 {
        match self {
            Criterion::Gini => gini(labels),
            Criterion::Entropy => entropy(labels),
        }
    }
}

impl FromStr for Criterion {
    type Err = ModelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "gini" => Ok(Criterion::Gini),
            "entropy" => Ok(Criterion::Entropy),
            other => Err(ModelError::validation(format!(
                "Unsupported criterion '{other}', expected 'gini' or 'entropy'."
            ))),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Gini => write!(f, "gini"),
            Criterion::Entropy => write!(f, "entropy"),
        }
    }
}

/// Occurrences of every label, keyed in ascending label order.
pub fn class_counts<T: WholeNumber>(labels: &[T]) -> BTreeMap<T, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(*label).or_insert(0) += 1;
    }
    counts
}

/// Gini impurity `1 - sum(p_c^2)`. Zero for an empty slice.
pub fn gini<T: WholeNumber>(labels: &[T]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total = labels.len() as f64;
    class_counts(labels).values().fold(1.0, |impurity, &count| {
        let p_class = count as f64 / total;
        impurity - p_class * p_class
    })
}

/// Shannon entropy in bits `-sum(p_c * log2(p_c))`. Zero for an empty slice.
pub fn entropy<T: WholeNumber>(labels: &[T]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total = labels.len() as f64;
    class_counts(labels).values().fold(0.0, |entropy, &count| {
        let p_class = count as f64 / total;
        entropy - p_class * p_class.log2()
    })
}

/// Most frequent label; on a tie the lowest label wins.
pub fn majority_vote<T: WholeNumber>(labels: &[T]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    // Ascending iteration plus a strict comparison keeps the lowest tied label.
    for (label, count) in class_counts(labels) {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}
