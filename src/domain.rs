//! The box a proposal must land in.
//!
//! A [`Domain`] applies the same `(low, high)` bounds to every coordinate.
//! The boundary retry in [`selection`](crate::selection) works on a
//! [`tightened`](Domain::tightened) copy and never mutates the caller's
//! domain.

use crate::error::{Error, Result};
use crate::rng_util;

/// Offset kept below the upper bound when clipping a final proposal.
pub const UPPER_EPSILON: f64 = 1e-6;

/// Scalar bounds applied uniformly to every dimension.
///
/// # Examples
///
/// ```
/// use bbopt::Domain;
///
/// let domain = Domain::new(0.0, 1.0).unwrap();
/// let inner = domain.tightened(0.05).unwrap();
/// assert!((inner.low() - 0.05).abs() < 1e-12);
/// assert!((inner.high() - 0.95).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    low: f64,
    high: f64,
}

impl Domain {
    /// Creates a domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] unless both bounds are finite and
    /// `low < high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(Error::InvalidBounds { low, high });
        }
        Ok(Self { low, high })
    }

    /// The unit box `[0, 1]`.
    #[must_use]
    pub const fn unit() -> Self {
        Self {
            low: 0.0,
            high: 1.0,
        }
    }

    /// Lower bound.
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound.
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Width of the box along each dimension.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Returns a copy shrunk inward by `margin` on both ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if the shrunk box would be empty.
    pub fn tightened(&self, margin: f64) -> Result<Self> {
        Self::new(self.low + margin, self.high - margin)
    }

    /// Clamps a scalar into `[low, high]`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.low, self.high)
    }

    /// Clamps every coordinate into `[low, high - UPPER_EPSILON]`, so the
    /// result never sits exactly on the upper bound.
    #[must_use]
    pub fn clip_open(&self, point: &[f64]) -> Vec<f64> {
        let upper = (self.high - UPPER_EPSILON).max(self.low);
        point.iter().map(|&v| v.clamp(self.low, upper)).collect()
    }

    /// Smallest distance from any coordinate of `point` to either bound.
    ///
    /// Negative when a coordinate lies outside the box.
    #[must_use]
    pub fn boundary_distance(&self, point: &[f64]) -> f64 {
        point
            .iter()
            .map(|&v| (v - self.low).min(self.high - v))
            .fold(f64::INFINITY, f64::min)
    }

    /// Draws a point uniformly from the box.
    pub(crate) fn sample_uniform(&self, rng: &mut fastrand::Rng, n_dims: usize) -> Vec<f64> {
        (0..n_dims)
            .map(|_| rng_util::f64_range(rng, self.low, self.high))
            .collect()
    }

    /// Maps a unit-cube coordinate in `[0, 1)` into the box.
    pub(crate) fn scale_unit(&self, value: f64) -> f64 {
        self.low + value * self.width()
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::unit()
    }
}
