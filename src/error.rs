/// Errors returned by observation validation, configuration, and proposal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is not strictly below the upper bound.
    #[error("invalid bounds: low ({low}) must be less than high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when an observation set has no rows.
    #[error("observation set must contain at least one observation")]
    EmptyObservations,

    /// Returned when observation rows have zero dimensions.
    #[error("observations must have at least one dimension")]
    ZeroDimensions,

    /// Returned when an input row has a different length from the first row.
    #[error("ragged inputs: expected {expected} dimensions but row {row_index} has {got}")]
    RaggedInputs {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of dimensions in the row.
        got: usize,
        /// The index of the offending row.
        row_index: usize,
    },

    /// Returned when the number of input rows and output values differ.
    #[error("length mismatch: {n_inputs} input rows but {n_outputs} output values")]
    LengthMismatch {
        /// The number of input rows.
        n_inputs: usize,
        /// The number of output values.
        n_outputs: usize,
    },

    /// Returned when an input coordinate is NaN or infinite.
    #[error("non-finite input at row {row_index}, dimension {dim}")]
    NonFiniteInput {
        /// The index of the offending row.
        row_index: usize,
        /// The offending dimension.
        dim: usize,
    },

    /// Returned when an output value is NaN or infinite.
    #[error("non-finite output at index {0}")]
    NonFiniteOutput(usize),

    /// Returned when a point does not match the dimensionality of a function's observations.
    #[error("dimension mismatch: expected {expected} dimensions, got {got}")]
    DimensionMismatch {
        /// The dimensionality of the existing observations.
        expected: usize,
        /// The dimensionality of the supplied point.
        got: usize,
    },

    /// Returned when the boundary margin is negative or not finite.
    #[error("invalid boundary margin: {0} must be finite and non-negative")]
    InvalidMargin(f64),

    /// Returned when a tuning knob is not a finite number.
    #[error("invalid value for '{name}': {value} must be finite")]
    NonFiniteParameter {
        /// The name of the knob.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when a sample count or fold count is zero.
    #[error("invalid count for '{0}': must be at least 1")]
    ZeroCount(&'static str),

    /// Returned when a scale or bandwidth is not strictly positive.
    #[error("invalid scale for '{name}': {value} must be positive")]
    InvalidScale {
        /// The name of the knob.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the kernel matrix stays non positive-definite after jitter escalation.
    #[error("kernel matrix is not positive definite")]
    SingularKernel,

    /// Returned when selection is asked to choose from an empty pool.
    #[error("candidate pool is empty")]
    EmptyCandidatePool,

    /// Returned when an async task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;
