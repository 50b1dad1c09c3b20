//! A small demo: tune the step size on a shifted Gaussian, draw a sample
//! with a progress bar, and print the summary statistics.

use mini_metropolis::distributions::Gaussian1D;
use mini_metropolis::metropolis::Metropolis;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const SEED: u64 = 42;

    let target = Gaussian1D {
        mean: 3.0,
        std: 2.0,
    };
    let mut sampler = Metropolis::new(target, 10.0).set_seed(SEED);

    sampler.adapt(&[200, 200, 200])?;
    println!("Tuned step size: {:.3}", sampler.step_size());
    if let Some(rate) = sampler.acceptance_rate() {
        println!("Acceptance rate in last tuning block: {rate:.2}");
    }

    sampler.sample_progress(50_000)?;

    let summary = sampler.summary();
    println!("Recorded {} states", sampler.history().len());
    println!("Mean: {:.3}", summary.mean);
    println!(
        "95% credible interval: [{:.3}, {:.3}]",
        summary.c025, summary.c975
    );

    #[cfg(feature = "csv")]
    {
        mini_metropolis::io::save_csv(sampler.history(), "chain.csv")?;
        println!("Saved chain history to chain.csv");
    }

    Ok(())
}
