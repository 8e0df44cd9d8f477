//! Round drivers: one proposal per function from a single master seed.
//!
//! | Driver | Streams | Reproducible with |
//! |--------|---------|-------------------|
//! | [`propose_round`] | one stream shared in order | same seed, same function order |
//! | [`propose_round_split`] | one stream per function, [`split_seed`] | same seed, same index |
//! | `propose_round_parallel` (`async`) | as `propose_round_split` | identical to `propose_round_split` |
//!
//! Functions are independent: a failing function yields an `Err` in its
//! slot and the remaining functions are still proposed.

use crate::domain::Domain;
use crate::error::Result;
use crate::observation::ObservationSet;
use crate::rng_util::split_seed;
use crate::sampler::{Proposal, Proposer};

/// Proposes one point per function, threading a single RNG through the
/// functions in order.
///
/// Later functions see the stream after earlier ones consumed it, so
/// reordering `functions` changes their proposals.
///
/// # Examples
///
/// ```
/// use bbopt::round::propose_round;
/// use bbopt::sampler::SpaceFillingSampler;
/// use bbopt::{Domain, ObservationSet};
///
/// let functions = vec![
///     ObservationSet::new(vec![vec![0.2], vec![0.8]], vec![1.0, 2.0]).unwrap(),
///     ObservationSet::new(vec![vec![0.1, 0.1]], vec![0.5]).unwrap(),
/// ];
/// let sampler = SpaceFillingSampler::builder().num_random(100).num_lhs(100).build().unwrap();
///
/// let proposals = propose_round(&sampler, &functions, &Domain::unit(), 20_260_128);
/// assert_eq!(proposals.len(), 2);
/// assert_eq!(proposals[1].as_ref().unwrap().point.len(), 2);
/// ```
#[must_use]
pub fn propose_round<P>(
    proposer: &P,
    functions: &[ObservationSet],
    domain: &Domain,
    seed: u64,
) -> Vec<Result<Proposal>>
where
    P: Proposer + ?Sized,
{
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut proposals = Vec::with_capacity(functions.len());
    for observations in functions {
        let result = proposer.propose(observations, domain, &mut rng);
        trace_info!(function = proposals.len(), ok = result.is_ok(), "function proposed");
        proposals.push(result);
    }
    proposals
}

/// Proposes one point per function, each from its own stream seeded with
/// `split_seed(seed, index)`.
///
/// A function's proposal depends only on its own observations, its index
/// and the seed.
#[must_use]
pub fn propose_round_split<P>(
    proposer: &P,
    functions: &[ObservationSet],
    domain: &Domain,
    seed: u64,
) -> Vec<Result<Proposal>>
where
    P: Proposer + ?Sized,
{
    functions
        .iter()
        .enumerate()
        .map(|(index, observations)| propose_indexed(proposer, observations, domain, seed, index))
        .collect()
}

fn propose_indexed<P>(
    proposer: &P,
    observations: &ObservationSet,
    domain: &Domain,
    seed: u64,
    index: usize,
) -> Result<Proposal>
where
    P: Proposer + ?Sized,
{
    let mut rng = fastrand::Rng::with_seed(split_seed(seed, index));
    let result = proposer.propose(observations, domain, &mut rng);
    trace_info!(function = index, ok = result.is_ok(), "function proposed");
    result
}

/// Runs [`propose_round_split`] with up to `concurrency` functions on
/// tokio's blocking pool at once.
///
/// Results are returned in input order and are identical to
/// [`propose_round_split`] with the same arguments.
///
/// # Errors
///
/// Returns [`Error::ZeroCount`](crate::Error::ZeroCount) if `concurrency`
/// is zero and [`Error::TaskError`](crate::Error::TaskError) if the
/// semaphore closes or a blocking task panics.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use bbopt::round::propose_round_parallel;
/// use bbopt::sampler::{Proposer, SpaceFillingSampler};
/// use bbopt::{Domain, ObservationSet};
///
/// # async fn example() -> bbopt::Result<()> {
/// let proposer: Arc<dyn Proposer> = Arc::new(SpaceFillingSampler::new());
/// let functions = vec![ObservationSet::new(vec![vec![0.5]], vec![1.0])?];
///
/// let proposals = propose_round_parallel(proposer, functions, Domain::unit(), 7, 4).await?;
/// assert_eq!(proposals.len(), 1);
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "async")]
pub async fn propose_round_parallel(
    proposer: std::sync::Arc<dyn Proposer>,
    functions: Vec<ObservationSet>,
    domain: Domain,
    seed: u64,
    concurrency: usize,
) -> Result<Vec<Result<Proposal>>> {
    use std::sync::Arc;

    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    use crate::error::Error;

    if concurrency == 0 {
        return Err(Error::ZeroCount("concurrency"));
    }

    #[cfg(feature = "tracing")]
    let _span =
        tracing::info_span!("propose_round_parallel", n_functions = functions.len(), concurrency)
            .entered();

    let n_functions = functions.len();
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set: JoinSet<(usize, Result<Proposal>)> = JoinSet::new();

    for (index, observations) in functions.into_iter().enumerate() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::TaskError(e.to_string()))?;
        let proposer = Arc::clone(&proposer);
        join_set.spawn_blocking(move || {
            let result = propose_indexed(proposer.as_ref(), &observations, &domain, seed, index);
            drop(permit);
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<Proposal>>> = (0..n_functions).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (index, result) = joined.map_err(|e| Error::TaskError(e.to_string()))?;
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| Error::TaskError("missing task result".to_owned())))
        .collect()
}
