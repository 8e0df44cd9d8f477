//! Observed inputs and outputs for a single black-box function.
//!
//! An [`ObservationSet`] is validated once at construction: every later stage
//! assumes N ≥ 1, D ≥ 1, rectangular finite inputs, and one finite output per
//! row. [`OutputStats`] condenses the outputs into the summary statistics
//! that drive the acquisition switch.

use crate::error::{Error, Result};

/// Past evaluations of one function: an N×D input matrix and N outputs.
///
/// Outputs are maximized: the "best" observation is the one with the
/// largest `y`.
///
/// # Examples
///
/// ```
/// use bbopt::ObservationSet;
///
/// let obs = ObservationSet::new(
///     vec![vec![0.1, 0.1], vec![0.5, 0.5], vec![0.9, 0.9]],
///     vec![1.0, 5.0, 2.0],
/// )
/// .unwrap();
///
/// assert_eq!(obs.len(), 3);
/// assert_eq!(obs.n_dims(), 2);
/// assert_eq!(obs.best_point(), &[0.5, 0.5]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ObservationSet {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
    n_dims: usize,
}

impl ObservationSet {
    /// Creates a validated observation set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyObservations`] if there are no rows,
    /// [`Error::ZeroDimensions`] if rows are empty,
    /// [`Error::RaggedInputs`] if rows differ in length,
    /// [`Error::LengthMismatch`] if `x` and `y` differ in length, and
    /// [`Error::NonFiniteInput`] / [`Error::NonFiniteOutput`] for NaN or
    /// infinite values.
    pub fn new(x: Vec<Vec<f64>>, y: Vec<f64>) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::EmptyObservations);
        }
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                n_inputs: x.len(),
                n_outputs: y.len(),
            });
        }

        let n_dims = x[0].len();
        if n_dims == 0 {
            return Err(Error::ZeroDimensions);
        }

        for (row_index, row) in x.iter().enumerate() {
            if row.len() != n_dims {
                return Err(Error::RaggedInputs {
                    expected: n_dims,
                    got: row.len(),
                    row_index,
                });
            }
            if let Some(dim) = row.iter().position(|v| !v.is_finite()) {
                return Err(Error::NonFiniteInput { row_index, dim });
            }
        }
        if let Some(index) = y.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteOutput(index));
        }

        Ok(Self { x, y, n_dims })
    }

    /// Number of observations (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether the set holds no observations.
    ///
    /// Construction rejects empty sets and [`push`](Self::push) only grows
    /// them, so this is `false` for every set this crate hands out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Dimensionality of every input row (D).
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// Input rows.
    #[must_use]
    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.x
    }

    /// Output values, aligned with [`inputs`](Self::inputs).
    #[must_use]
    pub fn outputs(&self) -> &[f64] {
        &self.y
    }

    /// Index of the largest output (first occurrence on ties).
    #[must_use]
    pub fn best_index(&self) -> usize {
        argmax(&self.y).unwrap_or(0)
    }

    /// Input row of the best observation.
    #[must_use]
    pub fn best_point(&self) -> &[f64] {
        &self.x[self.best_index()]
    }

    /// Largest observed output.
    #[must_use]
    pub fn best_value(&self) -> f64 {
        self.y[self.best_index()]
    }

    /// Verifies that `point` has this set's dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] naming the expected and actual
    /// dimensionality.
    pub fn check_point(&self, point: &[f64]) -> Result<()> {
        if point.len() == self.n_dims {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.n_dims,
                got: point.len(),
            })
        }
    }

    /// Appends a newly evaluated point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `point` has the wrong
    /// dimensionality, or a non-finite error if any value is NaN or infinite.
    pub fn push(&mut self, point: Vec<f64>, value: f64) -> Result<()> {
        self.check_point(&point)?;
        let row_index = self.len();
        if let Some(dim) = point.iter().position(|v| !v.is_finite()) {
            return Err(Error::NonFiniteInput { row_index, dim });
        }
        if !value.is_finite() {
            return Err(Error::NonFiniteOutput(row_index));
        }
        self.x.push(point);
        self.y.push(value);
        Ok(())
    }

    /// Euclidean distance from `point` to the closest observed input.
    #[must_use]
    pub fn nearest_distance(&self, point: &[f64]) -> f64 {
        self.x
            .iter()
            .map(|row| euclidean(row, point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Summary statistics of the outputs.
    #[must_use]
    pub fn output_stats(&self) -> OutputStats {
        OutputStats::from_outputs(&self.y)
    }
}

/// Summary statistics over a function's observed outputs.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputStats {
    /// Largest observed output.
    pub best: f64,
    /// Median output (mean of the two middle values for even N).
    pub median: f64,
    /// Population standard deviation of the outputs.
    pub std: f64,
    /// `max - min` of the outputs.
    pub range: f64,
}

impl OutputStats {
    /// Computes statistics over a non-empty slice of outputs.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_outputs(y: &[f64]) -> Self {
        let n = y.len().max(1) as f64;
        let mean = y.iter().sum::<f64>() / n;
        let var = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let best = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let worst = y.iter().copied().fold(f64::INFINITY, f64::min);
        Self {
            best,
            median: median(y),
            std: var.sqrt(),
            range: best - worst,
        }
    }

    /// Standard deviation with zero replaced by 1.
    #[must_use]
    pub fn std_or_one(&self) -> f64 {
        if self.std > 0.0 { self.std } else { 1.0 }
    }

    /// How many floored standard deviations the best output sits above the median.
    #[must_use]
    pub fn z_best(&self) -> f64 {
        (self.best - self.median) / self.std_or_one()
    }
}

/// Euclidean distance between two points of equal length.
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Median of a slice; 0 for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Index of the first maximum, ignoring NaN. `None` if nothing compares.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
