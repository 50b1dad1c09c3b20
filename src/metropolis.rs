/*!
# Adaptive Random-Walk Metropolis Sampler

This module implements a single-chain random-walk Metropolis sampler for
scalar states. Candidate states are drawn from a normal distribution centred
at the current state with standard deviation equal to the current step size,
and accepted or rejected with the Metropolis criterion. Before the final
sampling run the step size can be tuned with [`Metropolis::adapt`], which
runs fixed-length blocks of iterations and rescales the step size from the
acceptance fraction observed in each block.

## Overview

- **Target (`D`)**: provides the unnormalized log-density via the
  [`Target`](crate::distributions::Target) trait.
- **Proposals**: symmetric normal, centred at the current state; the
  proposal density cancels out of the acceptance ratio.
- **History**: every iteration appends exactly one value to the chain
  history, the accepted proposal or a repeated copy of the unchanged
  current state. Rejections must leave this duplicate so that the recorded
  trajectory reflects the stationary distribution.
- **Reproducibility**: the sampler owns a `SmallRng`; [`Metropolis::set_seed`]
  makes the whole run, adaptation included, bit-reproducible.

## Example Usage

```rust
use mini_metropolis::distributions::Gaussian1D;
use mini_metropolis::metropolis::Metropolis;

let target = Gaussian1D { mean: 0.0, std: 1.0 };
let mut sampler = Metropolis::new(target, 0.0).set_seed(42);

// Tune the step size, then draw the actual sample.
sampler.adapt(&[100, 100])?.sample(1_000)?;

let summary = sampler.summary();
assert!(summary.c025 <= summary.mean && summary.mean <= summary.c975);
# Ok::<(), mini_metropolis::metropolis::MetropolisError>(())
```
*/

use std::collections::VecDeque;

use indicatif::{ProgressBar, ProgressStyle};
use num_traits::{Float, FromPrimitive, ToPrimitive};
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Standard, StandardNormal};
use thiserror::Error;

use crate::distributions::{Target, TargetError};
use crate::stats::{self, Summary};

/// Acceptance fraction below which a tuning block halves the step size.
const LOW_ACCEPTANCE: f64 = 0.1;
/// Acceptance fraction above which a tuning block doubles the step size.
const HIGH_ACCEPTANCE: f64 = 0.6;

/// Width of the sliding window used for the acceptance readout of
/// [`Metropolis::sample_progress`]. Display only, never fed back into tuning.
const PROGRESS_WINDOW: usize = 100;

/// Errors reported by the sampler.
#[derive(Debug, PartialEq, Error)]
pub enum MetropolisError {
    /// The step size is required to be strictly positive and finite before
    /// any proposal can be drawn from it.
    #[error("step size must be strictly positive and finite, got {0}")]
    InvalidStepSize(f64),
    /// Adaptation blocks must contain at least one iteration, otherwise no
    /// acceptance fraction can be computed for them.
    #[error("adaptation block lengths must be positive")]
    ZeroLengthBlock,
    /// The target distribution failed to evaluate a state.
    #[error(transparent)]
    Target(#[from] TargetError),
}

/**
A single-chain random-walk Metropolis sampler.

The sampler owns the target distribution, the current state, the step size
(the proposal standard deviation, starting at 1.0), the chain history and a
seedable random number generator. The history is append-only and unbounded:
it keeps every visited value from both adaptation and sampling phases, seed
state included, so memory grows linearly with the total number of
iterations. Long chains should budget for one `T` per iteration.

# Type Parameters
- `T`: the floating-point state type (e.g. `f32` or `f64`).
- `D`: the target distribution type. Must implement
  [`Target`](crate::distributions::Target).

# Examples

```rust
use mini_metropolis::distributions::Gaussian1D;
use mini_metropolis::metropolis::Metropolis;

let target = Gaussian1D { mean: 0.0, std: 1.0 };
let sampler = Metropolis::new(target, 0.5).set_seed(42);
assert_eq!(sampler.history(), &[0.5]);
assert_eq!(sampler.step_size(), 1.0);
assert_eq!(sampler.acceptance_rate(), None);
```
*/
#[derive(Debug, Clone)]
pub struct Metropolis<T, D> {
    /// The target distribution we want to sample from.
    target: D,
    /// The current position of the chain.
    current_state: T,
    /// Standard deviation of the normal proposal distribution.
    step_size: T,
    /// Every state visited so far, seed state first, one entry per
    /// iteration afterwards.
    history: Vec<T>,
    /// Acceptance fraction of the last completed tuning block, `None`
    /// until [`Metropolis::adapt`] has run at least one block.
    acceptance_rate: Option<T>,
    /// The random seed the generator was last seeded with.
    seed: u64,
    /// The random number generator for this chain.
    rng: SmallRng,
}

impl<T, D> Metropolis<T, D>
where
    T: Float + FromPrimitive,
    D: Target<T>,
    StandardNormal: Distribution<T>,
    Standard: Distribution<T>,
{
    /**
    Constructs a new sampler at `initial_state` with step size 1.0.

    The history starts out holding just the initial state, and the
    generator is seeded from the thread RNG; call [`Metropolis::set_seed`]
    for reproducible runs.

    # Examples

    ```rust
    use mini_metropolis::distributions::FnTarget;
    use mini_metropolis::metropolis::Metropolis;

    let sampler = Metropolis::new(FnTarget(|x: f64| -0.5 * x * x), 0.0);
    assert_eq!(sampler.history().len(), 1);
    assert_eq!(sampler.current_state(), 0.0);
    ```
    */
    pub fn new(target: D, initial_state: T) -> Self {
        let seed = thread_rng().gen::<u64>();
        Self {
            target,
            current_state: initial_state,
            step_size: T::one(),
            history: vec![initial_state],
            acceptance_rate: None,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reseeds the generator, making every subsequent proposal, acceptance
    /// decision and adaptation outcome reproducible.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /**
    Overrides the starting step size.

    Fails with [`MetropolisError::InvalidStepSize`] unless the value is
    strictly positive and finite.

    # Examples

    ```rust
    use mini_metropolis::distributions::FnTarget;
    use mini_metropolis::metropolis::Metropolis;

    let sampler = Metropolis::new(FnTarget(|x: f64| -x * x), 0.0)
        .set_step_size(2.5)
        .unwrap();
    assert_eq!(sampler.step_size(), 2.5);

    assert!(Metropolis::new(FnTarget(|x: f64| -x * x), 0.0)
        .set_step_size(0.0)
        .is_err());
    ```
    */
    pub fn set_step_size(mut self, step_size: T) -> Result<Self, MetropolisError> {
        Self::check_step_size(step_size)?;
        self.step_size = step_size;
        Ok(self)
    }

    /**
    Tunes the step size by running one accept/reject block per entry of
    `block_lengths`, in order.

    Each block runs at the step size left behind by the previous block,
    counts its accepted proposals and computes the block's acceptance
    fraction. A fraction below 0.1 halves the step size, one above 0.6
    doubles it, anything in between leaves it alone. After the call,
    [`Metropolis::acceptance_rate`] reports the fraction of the *last*
    block only; earlier blocks are transient tuning signal.

    All iterations extend the history exactly like [`Metropolis::sample`]
    does, so the recorded trajectory includes the tuning phase.

    An empty `block_lengths` is a no-op that leaves the step size, history
    and acceptance rate untouched. A zero block length fails the whole call
    with [`MetropolisError::ZeroLengthBlock`] before any iteration runs.

    # Examples

    ```rust
    use mini_metropolis::distributions::FnTarget;
    use mini_metropolis::metropolis::Metropolis;

    // A flat target accepts everything, so each block doubles the step.
    let mut sampler = Metropolis::new(FnTarget(|_: f64| 0.0), 0.0).set_seed(42);
    sampler.adapt(&[50])?;
    assert_eq!(sampler.step_size(), 2.0);
    assert_eq!(sampler.acceptance_rate(), Some(1.0));
    # Ok::<(), mini_metropolis::metropolis::MetropolisError>(())
    ```
    */
    pub fn adapt(&mut self, block_lengths: &[usize]) -> Result<&mut Self, MetropolisError> {
        if block_lengths.contains(&0) {
            return Err(MetropolisError::ZeroLengthBlock);
        }
        let two = T::from(2.0).unwrap();
        for &block_length in block_lengths {
            let mut accepted = 0usize;
            for _ in 0..block_length {
                accepted += usize::from(self.step()?);
            }
            let rate = T::from(accepted).unwrap() / T::from(block_length).unwrap();
            if rate < T::from(LOW_ACCEPTANCE).unwrap() {
                self.step_size = self.step_size / two;
            } else if rate > T::from(HIGH_ACCEPTANCE).unwrap() {
                self.step_size = self.step_size * two;
            }
            self.acceptance_rate = Some(rate);
        }
        Ok(self)
    }

    /**
    Extends the history by exactly `n_samples` accept/reject iterations at
    the current step size. No tuning happens here; callers wanting a
    sensible step size should [`Metropolis::adapt`] first.

    `n_samples == 0` is a valid no-op.
    */
    pub fn sample(&mut self, n_samples: usize) -> Result<&mut Self, MetropolisError> {
        for _ in 0..n_samples {
            self.step()?;
        }
        Ok(self)
    }

    /// Same as [`Metropolis::sample`], with a progress bar showing the
    /// acceptance fraction over a sliding window of recent iterations.
    pub fn sample_progress(&mut self, n_samples: usize) -> Result<&mut Self, MetropolisError> {
        let pb = ProgressBar::new(n_samples as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        let mut window = VecDeque::with_capacity(PROGRESS_WINDOW);
        for i in 0..n_samples {
            let accepted = self.step()?;
            if window.len() == PROGRESS_WINDOW {
                window.pop_front();
            }
            window.push_back(accepted);
            pb.inc(1);
            if (i + 1) % PROGRESS_WINDOW == 0 {
                let rate = window.iter().filter(|&&a| a).count() as f64 / window.len() as f64;
                pb.set_message(format!("p(accept)~{rate:.2}"));
            }
        }
        pb.finish_with_message("Done!");
        Ok(self)
    }

    /**
    Computes summary statistics over the entire accumulated history: the
    arithmetic mean and the 2.5th/97.5th percentiles (an empirical 95%
    credible interval).

    The history always contains at least the seed state, so this is
    callable at any time. Adaptation iterations are included; discard-free
    summaries are a caller concern.
    */
    pub fn summary(&self) -> Summary<T> {
        stats::summarize(&self.history)
    }

    /// The full chain trajectory, seed state first.
    pub fn history(&self) -> &[T] {
        &self.history
    }

    /// The chain's current position.
    pub fn current_state(&self) -> T {
        self.current_state
    }

    /// The current proposal standard deviation.
    pub fn step_size(&self) -> T {
        self.step_size
    }

    /// Acceptance fraction of the last completed tuning block, or `None`
    /// if no adaptation block has run. A genuine all-reject block reports
    /// `Some(0.0)`, distinguishable from "never tuned".
    pub fn acceptance_rate(&self) -> Option<T> {
        self.acceptance_rate
    }

    /// The seed the generator was last seeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Performs one accept/reject iteration and reports whether the
    /// proposal was accepted. Exactly one value is appended to the history
    /// on success; an error leaves the history untouched.
    fn step(&mut self) -> Result<bool, MetropolisError> {
        Self::check_step_size(self.step_size)?;
        let proposal = Normal::new(self.current_state, self.step_size)
            .expect("normal proposal is well-defined for a positive step size")
            .sample(&mut self.rng);

        let proposed_lp = self.checked_log_prob(proposal)?;
        let current_lp = self.checked_log_prob(self.current_state)?;

        // Both densities vanish when the chain sits outside the support
        // and proposes another point outside it; the ratio is
        // indeterminate there, so stay in place.
        if proposed_lp == T::neg_infinity() && current_lp == T::neg_infinity() {
            self.history.push(self.current_state);
            return Ok(false);
        }

        let log_ratio = proposed_lp - current_lp;
        let u: T = self.rng.gen();
        let accepted = u.ln() < log_ratio;
        if accepted {
            self.current_state = proposal;
        }
        self.history.push(self.current_state);
        Ok(accepted)
    }

    /// Evaluates the target at `x`, rejecting NaN and positive infinity,
    /// neither of which permits a valid acceptance decision.
    fn checked_log_prob(&self, x: T) -> Result<T, MetropolisError> {
        let lp = self.target.unnorm_log_prob(x)?;
        if lp.is_nan() || lp == T::infinity() {
            return Err(TargetError::NotFinite.into());
        }
        Ok(lp)
    }

    fn check_step_size(step_size: T) -> Result<(), MetropolisError> {
        if step_size > T::zero() && step_size.is_finite() {
            Ok(())
        } else {
            Err(MetropolisError::InvalidStepSize(
                step_size.to_f64().unwrap_or(f64::NAN),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{FnTarget, Gaussian1D, UniformInterval};

    fn standard_normal() -> Gaussian1D<f64> {
        Gaussian1D {
            mean: 0.0,
            std: 1.0,
        }
    }

    #[test]
    fn history_grows_by_exactly_one_per_iteration() {
        let mut sampler = Metropolis::new(FnTarget(|_: f64| 0.0), 0.0).set_seed(1);
        sampler.sample(0).unwrap();
        assert_eq!(sampler.history().len(), 1);
        sampler.sample(7).unwrap();
        assert_eq!(sampler.history().len(), 8);
        sampler.adapt(&[]).unwrap();
        assert_eq!(sampler.history().len(), 8);
        sampler.adapt(&[10, 5]).unwrap();
        assert_eq!(sampler.history().len(), 23);
    }

    #[test]
    fn seeded_runs_are_bit_identical() {
        let run = || {
            let mut sampler = Metropolis::new(standard_normal(), 1.5).set_seed(1234);
            sampler.adapt(&[100, 100]).unwrap().sample(1_000).unwrap();
            (
                sampler.history().to_vec(),
                sampler.step_size(),
                sampler.acceptance_rate(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn progress_sampling_matches_plain_sampling() {
        let mut plain = Metropolis::new(standard_normal(), 0.0).set_seed(99);
        let mut progress = Metropolis::new(standard_normal(), 0.0).set_seed(99);
        plain.sample(500).unwrap();
        progress.sample_progress(500).unwrap();
        assert_eq!(plain.history(), progress.history());
    }

    #[test]
    fn flat_target_doubles_step_size() {
        let mut sampler = Metropolis::new(FnTarget(|_: f64| 0.0), 0.0).set_seed(42);
        sampler.adapt(&[50]).unwrap();
        assert_eq!(sampler.step_size(), 2.0);
        assert_eq!(sampler.acceptance_rate(), Some(1.0));

        // Blocks are sequential: each one starts from the step size the
        // previous block left behind.
        let mut sampler = Metropolis::new(FnTarget(|_: f64| 0.0), 0.0).set_seed(42);
        sampler.adapt(&[10, 10]).unwrap();
        assert_eq!(sampler.step_size(), 4.0);
    }

    #[test]
    fn peaked_target_halves_step_size() {
        let mut sampler = Metropolis::new(FnTarget(|x: f64| -1.0e8 * x * x), 0.0).set_seed(7);
        sampler.adapt(&[100]).unwrap();
        assert_eq!(sampler.step_size(), 0.5);
        assert!(sampler.acceptance_rate().unwrap() < 0.1);
    }

    #[test]
    fn moderate_acceptance_leaves_step_size_unchanged() {
        // A proposal scale of 2.5 on the standard normal sits well inside
        // the no-rescale band (acceptance around 0.4).
        let mut sampler = Metropolis::new(standard_normal(), 0.0)
            .set_seed(42)
            .set_step_size(2.5)
            .unwrap();
        sampler.adapt(&[200]).unwrap();
        assert_eq!(sampler.step_size(), 2.5);
        let rate = sampler.acceptance_rate().unwrap();
        assert!(
            (0.1..=0.6).contains(&rate),
            "Expected acceptance in [0.1, 0.6], got {rate}"
        );
    }

    #[test]
    fn empty_adaptation_is_a_noop() {
        let mut sampler = Metropolis::new(standard_normal(), 0.25).set_seed(5);
        sampler.adapt(&[]).unwrap();
        assert_eq!(sampler.step_size(), 1.0);
        assert_eq!(sampler.history(), &[0.25]);
        assert_eq!(sampler.acceptance_rate(), None);
    }

    #[test]
    fn zero_length_block_is_rejected_up_front() {
        let mut sampler = Metropolis::new(standard_normal(), 0.0).set_seed(5);
        let err = sampler.adapt(&[5, 0]).unwrap_err();
        assert_eq!(err, MetropolisError::ZeroLengthBlock);
        // Rejected before any iteration ran.
        assert_eq!(sampler.history().len(), 1);
        assert_eq!(sampler.step_size(), 1.0);
        assert_eq!(sampler.acceptance_rate(), None);
    }

    #[test]
    fn rejection_appends_unchanged_current_state() {
        // The proposal is a continuous draw, so it never hits 0.0 exactly
        // and every iteration rejects.
        let target = FnTarget(|x: f64| if x == 0.0 { 0.0 } else { f64::NEG_INFINITY });
        let mut sampler = Metropolis::new(target, 0.0).set_seed(11);
        sampler.sample(5).unwrap();
        assert_eq!(sampler.current_state(), 0.0);
        assert_eq!(sampler.history(), &[0.0; 6]);
    }

    #[test]
    fn indeterminate_ratio_rejects_instead_of_erroring() {
        // Chain seeded far outside the support: both log-densities are
        // negative infinity for every proposal it will realistically draw.
        let target = UniformInterval {
            low: 0.0,
            high: 1.0,
        };
        let mut sampler = Metropolis::new(target, 9.0).set_seed(3);
        sampler.sample(20).unwrap();
        assert_eq!(sampler.current_state(), 9.0);
        assert_eq!(sampler.history(), &[9.0; 21]);
    }

    #[test]
    fn target_error_propagates_without_spurious_history_entry() {
        #[derive(Debug)]
        struct Failing;
        impl Target<f64> for Failing {
            fn unnorm_log_prob(&self, _x: f64) -> Result<f64, TargetError> {
                Err(TargetError::OutOfDomain)
            }
        }

        let mut sampler = Metropolis::new(Failing, 0.0).set_seed(8);
        let err = sampler.sample(3).unwrap_err();
        assert_eq!(err, MetropolisError::Target(TargetError::OutOfDomain));
        assert_eq!(sampler.history().len(), 1);
        assert_eq!(sampler.current_state(), 0.0);
    }

    #[test]
    fn nan_log_density_is_a_contract_violation() {
        let mut sampler = Metropolis::new(FnTarget(|_: f64| f64::NAN), 0.0).set_seed(8);
        let err = sampler.sample(1).err().expect("Expected a target error");
        assert_eq!(err, MetropolisError::Target(TargetError::NotFinite));
        assert_eq!(sampler.history().len(), 1);
    }

    #[test]
    fn non_positive_step_sizes_are_rejected() {
        for bad in [0.0, -1.0, f64::NEG_INFINITY, f64::INFINITY, f64::NAN] {
            let result = Metropolis::new(standard_normal(), 0.0).set_step_size(bad);
            assert!(
                result.is_err(),
                "Expected step size {bad} to be rejected."
            );
        }
    }
}
