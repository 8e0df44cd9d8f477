//! Gaussian-process surrogate: kernel, exact regression, and hyperparameter search.
//!
//! The surrogate uses `amplitude × Matérn₅⸝₂(length_scale) + white noise`
//! with standardized outputs. Hyperparameters are chosen per function per
//! round by a small randomized, cross-validated search
//! ([`search::search`]) whose winner is then refined by Nelder–Mead on the
//! log marginal likelihood. The model is created fresh each time and never
//! persisted.

mod kernel;
mod model;
mod refine;
pub mod search;

pub use kernel::KernelParams;
pub use model::{GaussianProcess, Prediction};
pub use search::{SearchConfig, SearchOutcome};
