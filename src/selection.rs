//! Selection & boundary guard.
//!
//! Turns a scored candidate pool into one choice:
//!
//! 1. Rescale each acquisition score by `0.2 + 0.8 × ramp`, where the ramp
//!    rises linearly from 0 at a bound to 1 at `margin` inside it.
//! 2. Mask candidates within [`DUPLICATE_TOLERANCE`] of an existing
//!    observation; if that masks everything, select without the mask.
//! 3. Take the arg-max (first occurrence).
//!
//! [`select_with_retry`] wraps a whole proposal attempt and, if the winner
//! still sits inside the margin, reruns it exactly once on the tightened
//! box.

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::observation::{ObservationSet, argmax};

/// Candidates this close to an existing observation are treated as duplicates.
pub const DUPLICATE_TOLERANCE: f64 = 1e-4;
/// Weight applied to a candidate sitting exactly on a bound.
pub const BOUNDARY_FLOOR: f64 = 0.2;
/// Upper bound on proposal attempts: the first try plus one tightened retry.
pub const MAX_ATTEMPTS: usize = 2;

/// Linear ramp from 0 at a bound to 1 at `margin` inside it.
///
/// With a non-positive margin every candidate gets ramp 1.
#[must_use]
pub fn boundary_ramp(boundary_distance: f64, margin: f64) -> f64 {
    if margin <= 0.0 {
        return 1.0;
    }
    (boundary_distance / margin).clamp(0.0, 1.0)
}

/// Multiplicative penalty applied to a candidate's acquisition score.
///
/// # Examples
///
/// ```
/// use bbopt::selection::boundary_weight;
///
/// assert!((boundary_weight(0.0, 0.05) - 0.2).abs() < 1e-12);
/// assert!((boundary_weight(0.05, 0.05) - 1.0).abs() < 1e-12);
/// assert!((boundary_weight(0.025, 0.05) - 0.6).abs() < 1e-12);
/// ```
#[must_use]
pub fn boundary_weight(boundary_distance: f64, margin: f64) -> f64 {
    BOUNDARY_FLOOR + (1.0 - BOUNDARY_FLOOR) * boundary_ramp(boundary_distance, margin)
}

/// The winning candidate of one selection pass.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    /// Index of the winner in the pool.
    pub index: usize,
    /// Acquisition score after the boundary penalty.
    pub score: f64,
    /// Acquisition score before the boundary penalty.
    pub raw_score: f64,
    /// Distance from the winner to the closest observation.
    pub nearest_distance: f64,
    /// Distance from the winner to the closest bound (before penalty).
    pub boundary_distance: f64,
    /// `true` if every candidate was a duplicate and the mask was ignored.
    pub duplicate_mask_dropped: bool,
}

/// Picks the best candidate after the boundary penalty and duplicate mask.
///
/// NaN scores never win. If nothing compares at all, the first candidate is
/// chosen.
///
/// # Errors
///
/// Returns [`Error::EmptyCandidatePool`] if `points` is empty.
pub fn select(
    raw_scores: &[f64],
    points: &[Vec<f64>],
    observations: &ObservationSet,
    domain: &Domain,
    margin: f64,
) -> Result<Selection> {
    if points.is_empty() {
        return Err(Error::EmptyCandidatePool);
    }

    let boundary: Vec<f64> = points.iter().map(|p| domain.boundary_distance(p)).collect();
    let nearest: Vec<f64> = points
        .iter()
        .map(|p| observations.nearest_distance(p))
        .collect();
    let penalized: Vec<f64> = raw_scores
        .iter()
        .zip(&boundary)
        .map(|(&s, &d)| s * boundary_weight(d, margin))
        .collect();
    let masked: Vec<f64> = penalized
        .iter()
        .zip(&nearest)
        .map(|(&s, &d)| {
            if d > DUPLICATE_TOLERANCE {
                s
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect();

    let (index, duplicate_mask_dropped) = match argmax(&masked) {
        Some(i) if masked[i] > f64::NEG_INFINITY => (i, false),
        _ => {
            trace_debug!("every candidate is a duplicate, dropping mask");
            (argmax(&penalized).unwrap_or(0), true)
        }
    };

    Ok(Selection {
        index,
        score: penalized[index],
        raw_score: raw_scores[index],
        nearest_distance: nearest[index],
        boundary_distance: boundary[index],
        duplicate_mask_dropped,
    })
}

/// Result of a boundary-guarded proposal.
#[derive(Clone, Debug, PartialEq)]
pub struct Guarded<T> {
    /// Whatever the accepted attempt produced alongside its selection.
    pub value: T,
    /// The accepted selection.
    pub selection: Selection,
    /// The domain the accepted attempt ran in.
    pub domain: Domain,
    /// 1 if the first attempt was accepted, 2 if the retry ran.
    pub attempts: usize,
}

/// Runs `attempt` on `domain`; if its winner lies closer than `margin` to a
/// bound, runs it once more on `domain.tightened(margin)` and accepts that
/// result unconditionally.
///
/// At most [`MAX_ATTEMPTS`] calls are made. If the tightened box would be
/// empty, the first attempt is kept.
///
/// # Errors
///
/// Propagates any error from `attempt`.
///
/// # Examples
///
/// ```
/// use bbopt::Domain;
/// use bbopt::selection::{Selection, select_with_retry};
///
/// let domain = Domain::unit();
/// let guarded = select_with_retry(&domain, 0.05, |d: &Domain| {
///     let selection = Selection {
///         index: 0,
///         score: 1.0,
///         raw_score: 1.0,
///         nearest_distance: 0.3,
///         // First pass lands on the bound; the tightened pass lands inside.
///         boundary_distance: if d.low() == 0.0 { 0.0 } else { 0.2 },
///         duplicate_mask_dropped: false,
///     };
///     Ok(((), selection))
/// })
/// .unwrap();
///
/// assert_eq!(guarded.attempts, 2);
/// assert!((guarded.domain.low() - 0.05).abs() < 1e-12);
/// ```
pub fn select_with_retry<T, F>(domain: &Domain, margin: f64, mut attempt: F) -> Result<Guarded<T>>
where
    F: FnMut(&Domain) -> Result<(T, Selection)>,
{
    let (value, selection) = attempt(domain)?;
    if selection.boundary_distance >= margin {
        return Ok(Guarded {
            value,
            selection,
            domain: *domain,
            attempts: 1,
        });
    }

    let Ok(tightened) = domain.tightened(margin) else {
        trace_debug!(margin, "tightened domain is empty, keeping first attempt");
        return Ok(Guarded {
            value,
            selection,
            domain: *domain,
            attempts: 1,
        });
    };

    trace_debug!(
        boundary_distance = selection.boundary_distance,
        margin,
        "winner inside boundary margin, retrying on tightened domain"
    );
    let (value, selection) = attempt(&tightened)?;
    Ok(Guarded {
        value,
        selection,
        domain: tightened,
        attempts: MAX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations() -> ObservationSet {
        ObservationSet::new(vec![vec![0.5, 0.5], vec![0.2, 0.8]], vec![1.0, 2.0]).unwrap()
    }

    #[test]
    fn ramp_is_zero_at_bound_and_one_past_margin() {
        assert_eq!(boundary_ramp(0.0, 0.05), 0.0);
        assert_eq!(boundary_weight(0.0, 0.05), 0.2);
        assert_eq!(boundary_ramp(0.05, 0.05), 1.0);
        assert_eq!(boundary_weight(0.3, 0.05), 1.0);
        assert_eq!(boundary_ramp(-0.1, 0.05), 0.0);
        assert_eq!(boundary_weight(0.0, 0.0), 1.0);
    }

    #[test]
    fn penalty_can_flip_the_winner() {
        let points = vec![vec![0.0, 0.5], vec![0.3, 0.4]];
        let scores = vec![1.0, 0.5];
        let sel = select(&scores, &points, &observations(), &Domain::unit(), 0.05).unwrap();
        assert_eq!(sel.index, 1);
        assert_eq!(sel.raw_score, 0.5);
        assert_eq!(sel.score, 0.5);
        assert!((sel.boundary_distance - 0.3).abs() < 1e-12);
    }

    #[test]
    fn duplicates_never_win_while_alternatives_exist() {
        let points = vec![vec![0.5, 0.5], vec![0.50005, 0.5], vec![0.3, 0.3]];
        let scores = vec![100.0, 90.0, 0.01];
        let sel = select(&scores, &points, &observations(), &Domain::unit(), 0.05).unwrap();
        assert_eq!(sel.index, 2);
        assert!(!sel.duplicate_mask_dropped);
        assert!(sel.nearest_distance > DUPLICATE_TOLERANCE);
    }

    #[test]
    fn all_duplicates_fall_back_to_unmasked_scores() {
        let points = vec![vec![0.5, 0.5], vec![0.2, 0.8]];
        let scores = vec![1.0, 3.0];
        let sel = select(&scores, &points, &observations(), &Domain::unit(), 0.05).unwrap();
        assert_eq!(sel.index, 1);
        assert!(sel.duplicate_mask_dropped);
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let points = vec![vec![0.3, 0.3], vec![0.4, 0.4], vec![0.6, 0.6]];
        let scores = vec![1.0, 2.0, 2.0];
        let sel = select(&scores, &points, &observations(), &Domain::unit(), 0.05).unwrap();
        assert_eq!(sel.index, 1);
    }

    #[test]
    fn nan_scores_never_win() {
        let points = vec![vec![0.3, 0.3], vec![0.4, 0.4]];
        let scores = vec![f64::NAN, -5.0];
        let sel = select(&scores, &points, &observations(), &Domain::unit(), 0.05).unwrap();
        assert_eq!(sel.index, 1);
    }

    #[test]
    fn empty_pool_is_an_error() {
        assert!(matches!(
            select(&[], &[], &observations(), &Domain::unit(), 0.05),
            Err(Error::EmptyCandidatePool)
        ));
    }

    fn fixed(boundary_distance: f64) -> Selection {
        Selection {
            index: 0,
            score: 1.0,
            raw_score: 1.0,
            nearest_distance: 1.0,
            boundary_distance,
            duplicate_mask_dropped: false,
        }
    }

    #[test]
    fn retry_runs_once_on_tightened_domain() {
        let domain = Domain::new(0.001, 0.98).unwrap();
        let mut seen = Vec::new();
        let guarded = select_with_retry(&domain, 0.05, |d: &Domain| {
            seen.push(*d);
            // Both attempts land near a bound; the second is accepted anyway.
            Ok((seen.len(), fixed(0.01)))
        })
        .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(guarded.attempts, 2);
        assert_eq!(guarded.value, 2);
        assert!((guarded.domain.low() - (domain.low() + 0.05)).abs() < 1e-15);
        assert!((guarded.domain.high() - (domain.high() - 0.05)).abs() < 1e-15);
    }

    #[test]
    fn no_retry_when_first_winner_is_clear_of_margin() {
        let domain = Domain::unit();
        let mut calls = 0;
        let guarded = select_with_retry(&domain, 0.05, |_: &Domain| {
            calls += 1;
            Ok(((), fixed(0.05)))
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(guarded.attempts, 1);
        assert_eq!(guarded.domain, domain);
    }

    #[test]
    fn collapsed_tightened_domain_keeps_first_attempt() {
        let domain = Domain::new(0.0, 0.08).unwrap();
        let mut calls = 0;
        let guarded = select_with_retry(&domain, 0.05, |_: &Domain| {
            calls += 1;
            Ok(((), fixed(0.0)))
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(guarded.attempts, 1);
    }

    #[test]
    fn errors_from_attempt_propagate() {
        let result: Result<Guarded<()>> =
            select_with_retry(&Domain::unit(), 0.05, |_: &Domain| Err(Error::SingularKernel));
        assert!(matches!(result, Err(Error::SingularKernel)));
    }
}
