//! Summary statistics over an accumulated chain history.

use std::cmp::Ordering;

use ndarray::aview1;
use num_traits::{Float, FromPrimitive, ToPrimitive};

/// Point estimate and 95% credible interval computed from a chain history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary<T> {
    /// Arithmetic mean of the history.
    pub mean: T,
    /// 2.5th percentile of the history.
    pub c025: T,
    /// 97.5th percentile of the history.
    pub c975: T,
}

/// Computes the [`Summary`] of a chain history.
///
/// Percentiles use linear interpolation between order statistics: for a
/// sorted sample of size `n` and fraction `q`, the value at rank
/// `q * (n - 1)` is interpolated between its two neighbouring order
/// statistics.
///
/// # Panics
///
/// Panics if `values` is empty. A sampler history always holds at least
/// its seed state.
///
/// # Examples
///
/// ```rust
/// use mini_metropolis::stats::summarize;
///
/// let summary = summarize(&[4.0, 1.0, 3.0, 2.0]);
/// assert_eq!(summary.mean, 2.5);
/// assert!(summary.c025 < summary.c975);
/// ```
pub fn summarize<T>(values: &[T]) -> Summary<T>
where
    T: Float + FromPrimitive,
{
    assert!(!values.is_empty(), "summary requires at least one value");
    let mean = aview1(values).mean().expect("mean of a non-empty slice");

    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(cmp_float);
    Summary {
        mean,
        c025: quantile(&sorted, T::from(0.025).unwrap()),
        c975: quantile(&sorted, T::from(0.975).unwrap()),
    }
}

/// Returns the `q`-quantile (`q` in `[0, 1]`) of an already sorted slice,
/// linearly interpolating between neighbouring order statistics.
///
/// # Examples
///
/// ```rust
/// use mini_metropolis::stats::quantile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile(&sorted, 0.5), 2.5);
/// assert_eq!(quantile(&sorted, 0.0), 1.0);
/// assert_eq!(quantile(&sorted, 1.0), 4.0);
/// ```
pub fn quantile<T: Float>(sorted: &[T], q: T) -> T {
    assert!(!sorted.is_empty(), "quantile requires at least one value");
    let rank = q * T::from(sorted.len() - 1).unwrap();
    let lower = rank.floor();
    let idx = lower.to_usize().unwrap();
    let upper = (idx + 1).min(sorted.len() - 1);
    sorted[idx] + (rank - lower) * (sorted[upper] - sorted[idx])
}

/// Comparison function for sorting float slices, treating NaN as greater
/// than all real values.
fn cmp_float<T: Float>(a: &T, b: &T) -> Ordering {
    if a.is_nan() {
        return Ordering::Greater;
    }
    if b.is_nan() {
        return Ordering::Less;
    }
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}
