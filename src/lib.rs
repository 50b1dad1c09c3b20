//! A compact library for adaptive random-walk Metropolis sampling over
//! scalar states.
//!
//! Proposals are drawn from a normal distribution centred at the current
//! state, accepted or rejected with the Metropolis rule, and the proposal
//! scale can be tuned from observed acceptance rates before the final
//! sampling run. See [`metropolis::Metropolis`] for the entry point.

pub mod distributions;
pub mod io;
pub mod metropolis;
pub mod stats;
