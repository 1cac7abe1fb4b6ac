use crate::data::dataset::{Number, WholeNumber};
use nalgebra::DVector;
use serde::Serialize;

/// Decision tree node
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode<XT: Number, YT: WholeNumber> {
    Leaf {
        value: YT,
    },
    Internal {
        feature_index: usize,
        threshold: XT,
        /// Impurity decrease achieved by this split.
        information_gain: f64,
        /// Training rows that reached this node.
        num_samples: usize,
        left: Box<TreeNode<XT, YT>>,
        right: Box<TreeNode<XT, YT>>,
    },
}

impl<XT: Number, YT: WholeNumber> TreeNode<XT, YT> {
    pub fn leaf(value: YT) -> Self {
        Self::Leaf { value }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Follows `features[feature_index] < threshold` to the left until a leaf is reached.
    pub fn predict(&self, features: &DVector<XT>) -> YT {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { value } => return *value,
                Self::Internal {
                    feature_index,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if features[*feature_index] < *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path. A single leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    /// Adds each split's sample-weighted gain to the entry of its feature.
    pub fn accumulate_importances(&self, importances: &mut [f64], root_samples: usize) {
        if let Self::Internal {
            feature_index,
            information_gain,
            num_samples,
            left,
            right,
            ..
        } = self
        {
            importances[*feature_index] +=
                *num_samples as f64 / root_samples as f64 * information_gain;
            left.accumulate_importances(importances, root_samples);
            right.accumulate_importances(importances, root_samples);
        }
    }

    pub fn visualize(&self, depth: usize) -> TreeVisualization<XT, YT> {
        match self {
            Self::Leaf { value } => TreeVisualization::Leaf {
                value: *value,
                depth,
            },
            Self::Internal {
                feature_index,
                threshold,
                left,
                right,
                ..
            } => TreeVisualization::Node {
                feature_idx: *feature_index,
                threshold: *threshold,
                left: Box::new(left.visualize(depth + 1)),
                right: Box::new(right.visualize(depth + 1)),
                depth,
            },
        }
    }
}

/// Serializable description of a tree, as consumed by the visualization frontend.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeVisualization<XT, YT> {
    Leaf {
        value: YT,
        depth: usize,
    },
    Node {
        feature_idx: usize,
        threshold: XT,
        left: Box<TreeVisualization<XT, YT>>,
        right: Box<TreeVisualization<XT, YT>>,
        depth: usize,
    },
}
