use crate::error::ModelError;
use nalgebra::{DMatrix, DVector};
use num_traits::{FromPrimitive, Num, ToPrimitive};
use rand::Rng;
use serde::Serialize;
use std::cmp::PartialOrd;
use std::fmt::{self, Display};
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

pub trait DataValue:
    Debug
    + Clone
    + Copy
    + Num
    + FromPrimitive
    + ToPrimitive
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + Send
    + Sync
    + Display
    + Serialize
    + 'static
{
}

impl<T> DataValue for T where
    T: Debug
        + Clone
        + Copy
        + Num
        + FromPrimitive
        + ToPrimitive
        + AddAssign
        + SubAssign
        + MulAssign
        + DivAssign
        + Send
        + Sync
        + Display
        + Serialize
        + 'static
{
}

/// Values usable as features: anything numeric that can be compared against a threshold.
pub trait Number: DataValue + PartialOrd {}
impl<T> Number for T where T: DataValue + PartialOrd {}

/// Values usable as class labels. Totally ordered so that ties can be broken by the lowest label.
pub trait WholeNumber: Number + Eq + Ord + Hash {}
impl<T> WholeNumber for T where T: Number + Eq + Ord + Hash {}

pub trait TargetValue: DataValue {}
impl<T> TargetValue for T where T: DataValue {}

#[derive(Clone, PartialEq)]
pub struct Dataset<XT: Number, YT: TargetValue> {
    pub x: DMatrix<XT>,
    pub y: DVector<YT>,
}

impl<XT: Number, YT: TargetValue> Debug for Dataset<XT, YT> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Dataset {{\n    x: [\n")?;

        for i in 0..self.x.nrows() {
            write!(f, "        [")?;
            for j in 0..self.x.ncols() {
                write!(f, "{:?}, ", self.x[(i, j)])?;
            }
            writeln!(f, "],")?;
        }

        write!(f, "    ],\n    y: [")?;
        for i in 0..self.y.len() {
            write!(f, "{:?}, ", self.y[i])?;
        }
        write!(f, "]\n}}")
    }
}

impl<XT: Number, YT: TargetValue> Dataset<XT, YT> {
    pub fn new(x: DMatrix<XT>, y: DVector<YT>) -> Self {
        Self { x, y }
    }

    pub fn into_parts(&self) -> (&DMatrix<XT>, &DVector<YT>) {
        (&self.x, &self.y)
    }

    pub fn is_not_empty(&self) -> bool {
        !(self.x.is_empty() || self.y.is_empty())
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Checks that the dataset holds at least one row and one label per row.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.x.nrows() == 0 || self.y.is_empty() {
            return Err(ModelError::validation("The training data can't be empty."));
        }
        if self.x.nrows() != self.y.len() {
            return Err(ModelError::validation(format!(
                "Features and labels are of different sizes ({} rows, {} labels).",
                self.x.nrows(),
                self.y.len()
            )));
        }
        Ok(())
    }

    /// Partitions the rows into `value < threshold` (left) and `value >= threshold` (right).
    pub fn split_on_threshold(&self, feature_index: usize, threshold: XT) -> (Self, Self) {
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = (0..self.x.nrows())
            .partition(|&index| self.x[(index, feature_index)] < threshold);

        (self.select_rows(&left_indices), self.select_rows(&right_indices))
    }

    /// Rows at `indices`, in the given order. Indices may repeat.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self::new(self.x.select_rows(indices), self.y.select_rows(indices))
    }

    /// The same rows restricted to the columns at `indices`.
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self::new(self.x.select_columns(indices), self.y.clone())
    }

    /// Draws `sample_size` rows uniformly with replacement.
    pub fn samples<R: Rng + ?Sized>(&self, sample_size: usize, rng: &mut R) -> Self {
        let nrows = self.x.nrows();
        if nrows == 0 {
            return self.select_rows(&[]);
        }
        let sample_indices = (0..sample_size)
            .map(|_| rng.gen_range(0..nrows))
            .collect::<Vec<_>>();

        self.select_rows(&sample_indices)
    }

    /// A bootstrap sample: as many rows as the dataset has, drawn with replacement.
    pub fn bootstrap<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        self.samples(self.x.nrows(), rng)
    }
}
