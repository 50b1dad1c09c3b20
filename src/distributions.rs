/*!
Defines the target-distribution seam used by the sampler along with a few
ready-made scalar targets.

A target supplies the unnormalized log-density of a state through the
[`Target`] trait. Evaluation is fallible: a target may refuse to evaluate a
state (for example a parameter outside its domain), and the sampler
propagates that error instead of making an acceptance decision on garbage.
Negative infinity is a legitimate return value and means "zero density
here"; NaN and positive infinity are never valid log-densities.

This module is generic over the floating-point precision (e.g., `f32` or
`f64`) using the [`num_traits::Float`] trait.

# Examples

```rust
use mini_metropolis::distributions::{FnTarget, Gaussian1D, Target};

// A stock Gaussian target.
let gauss = Gaussian1D { mean: 0.0, std: 1.0 };
assert_eq!(gauss.unnorm_log_prob(1.0).unwrap(), -0.5);

// Any pure closure works through the adapter.
let custom = FnTarget(|x: f64| -0.5 * x * x);
assert_eq!(custom.unnorm_log_prob(2.0).unwrap(), -2.0);
```
*/

use num_traits::Float;
use thiserror::Error;

/// An error signalled by a target distribution when it cannot produce a
/// usable log-density for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The state lies outside the domain of the target density.
    #[error("state lies outside the domain of the target density")]
    OutOfDomain,
    /// The target returned NaN or positive infinity, neither of which is a
    /// valid log-density. Negative infinity (zero density) is fine.
    #[error("target log-density evaluated to NaN or positive infinity")]
    NotFinite,
}

/// A scalar target distribution from which we want to sample.
///
/// Implementations must be pure: deterministic for a given input and free
/// of side effects. All randomness belongs to the sampler's own generator.
pub trait Target<T: Float> {
    /// Returns the log of the unnormalized density at `x`, or an error if
    /// the density cannot be evaluated there.
    fn unnorm_log_prob(&self, x: T) -> Result<T, TargetError>;
}

/// Adapter turning any pure closure `T -> T` into an infallible [`Target`].
///
/// # Examples
///
/// ```rust
/// use mini_metropolis::distributions::{FnTarget, Target};
///
/// let target = FnTarget(|x: f64| -x.abs());
/// assert_eq!(target.unnorm_log_prob(-3.0).unwrap(), -3.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnTarget<F>(pub F);

impl<T, F> Target<T> for FnTarget<F>
where
    T: Float,
    F: Fn(T) -> T,
{
    fn unnorm_log_prob(&self, x: T) -> Result<T, TargetError> {
        Ok((self.0)(x))
    }
}

/// A one-dimensional Gaussian target parameterized by mean and standard
/// deviation (`std` must be positive).
#[derive(Debug, Clone, Copy)]
pub struct Gaussian1D<T> {
    pub mean: T,
    pub std: T,
}

impl<T: Float> Target<T> for Gaussian1D<T> {
    fn unnorm_log_prob(&self, x: T) -> Result<T, TargetError> {
        let z = (x - self.mean) / self.std;
        Ok(-T::from(0.5).unwrap() * z * z)
    }
}

/// A flat target over the closed interval `[low, high]`, with zero density
/// (negative-infinite log-density) everywhere else.
#[derive(Debug, Clone, Copy)]
pub struct UniformInterval<T> {
    pub low: T,
    pub high: T,
}

impl<T: Float> Target<T> for UniformInterval<T> {
    fn unnorm_log_prob(&self, x: T) -> Result<T, TargetError> {
        if x < self.low || x > self.high {
            Ok(T::neg_infinity())
        } else {
            Ok(T::zero())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_log_prob_peaks_at_mean() {
        let target = Gaussian1D {
            mean: 2.0,
            std: 3.0,
        };
        let at_mean = target.unnorm_log_prob(2.0).unwrap();
        assert_eq!(at_mean, 0.0);
        assert!(target.unnorm_log_prob(5.0).unwrap() < at_mean);
        assert_eq!(
            target.unnorm_log_prob(5.0).unwrap(),
            target.unnorm_log_prob(-1.0).unwrap(),
        );
    }

    #[test]
    fn gaussian_matches_standard_normal_kernel() {
        let target = Gaussian1D {
            mean: 0.0,
            std: 1.0,
        };
        for x in [-2.0, -0.5, 0.0, 1.0, 4.2] {
            let expected = -0.5 * x * x;
            assert!((target.unnorm_log_prob(x).unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn uniform_interval_vanishes_outside_support() {
        let target = UniformInterval {
            low: -1.0,
            high: 1.0,
        };
        assert_eq!(target.unnorm_log_prob(0.0).unwrap(), 0.0);
        assert_eq!(target.unnorm_log_prob(1.0).unwrap(), 0.0);
        assert_eq!(target.unnorm_log_prob(1.5).unwrap(), f64::NEG_INFINITY);
        assert_eq!(target.unnorm_log_prob(-7.0).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn fn_target_wraps_closures() {
        let target = FnTarget(|x: f64| -x * x * x * x);
        assert_eq!(target.unnorm_log_prob(0.0).unwrap(), 0.0);
        assert_eq!(target.unnorm_log_prob(2.0).unwrap(), -16.0);
    }
}
