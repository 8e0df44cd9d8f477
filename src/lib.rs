#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Budget-constrained black-box optimization: given a handful of past
//! evaluations of an expensive, unknown function over a box, propose the
//! single next point worth evaluating.
//!
//! Every proposal is a pure function of the observations, the box and a
//! seed. No global RNG, no hidden state, no I/O.
//!
//! # Getting Started
//!
//! ```
//! use bbopt::prelude::*;
//!
//! let obs = ObservationSet::new(
//!     vec![vec![0.1, 0.2], vec![0.5, 0.5], vec![0.8, 0.3]],
//!     vec![0.2, 0.9, 0.4],
//! )?;
//! let domain = Domain::new(0.001, 0.98)?;
//! let sampler = GpSampler::builder().boundary_margin(0.05).build()?;
//!
//! let mut rng = fastrand::Rng::with_seed(20_260_204);
//! let proposal = sampler.propose(&obs, &domain, &mut rng)?;
//!
//! for (name, value) in proposal.diagnostics.to_map() {
//!     println!("{name}: {value:?}");
//! }
//! # Ok::<(), bbopt::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`ObservationSet`] | Validated N×D inputs and N outputs of one function. |
//! | [`Domain`] | Scalar `(low, high)` box shared by every coordinate. |
//! | [`Proposer`](sampler::Proposer) | Turns observations into one proposal. |
//! | [`Proposal`](sampler::Proposal) | The chosen point plus a [`Diagnostics`](sampler::Diagnostics) record. |
//! | [`AcquisitionPolicy`] | EI or UCB, derived from the output statistics. |
//!
//! # Proposers
//!
//! | Proposer | Policy | Use |
//! |----------|--------|-----|
//! | [`SpaceFillingSampler`](sampler::SpaceFillingSampler) | Max-min distance over uniform + Latin-hypercube candidates | Cold start |
//! | [`LocalKernelSampler`](sampler::LocalKernelSampler) | Nadaraya–Watson prediction + distance bonus | Cheap model-free refinement |
//! | [`GpSampler`](sampler::GpSampler) | GP surrogate, EI/UCB switch, boundary guard | Later rounds |
//!
//! Many functions are proposed together with the drivers in [`round`].
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | [`round::propose_round_parallel`] via tokio | off |
//! | `serde` | `Serialize`/`Deserialize` on proposals, diagnostics and configs | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key proposal points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
pub mod candidates;
pub mod domain;
mod error;
pub mod gp;
pub mod observation;
mod rng_util;
pub mod round;
pub mod sampler;
pub mod selection;

pub use acquisition::AcquisitionPolicy;
pub use domain::Domain;
pub use error::{Error, Result};
pub use observation::ObservationSet;
pub use rng_util::split_seed;
pub use sampler::{Diagnostics, Proposal, Proposer};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use bbopt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::AcquisitionPolicy;
    pub use crate::candidates::PoolConfig;
    pub use crate::domain::Domain;
    pub use crate::error::{Error, Result};
    pub use crate::gp::{KernelParams, SearchConfig};
    pub use crate::observation::ObservationSet;
    #[cfg(feature = "async")]
    pub use crate::round::propose_round_parallel;
    pub use crate::round::{propose_round, propose_round_split};
    pub use crate::rng_util::split_seed;
    pub use crate::sampler::{
        DiagnosticValue, Diagnostics, GpSampler, LocalKernelSampler, Proposal, Proposer,
        SpaceFillingSampler,
    };
}
