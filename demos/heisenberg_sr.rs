//! Heisenberg Ring Optimization via Stochastic Reconfiguration
//!
//! Trains a complex Jastrow wavefunction on a 10-site antiferromagnetic
//! Heisenberg ring with Metropolis sampling, then compares the Monte Carlo
//! energy against full enumeration.
//!
//! Usage:
//!   cargo run --example heisenberg_sr --release

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use vmc_kit::evaluation::{default_callbacks, MetricsHistory, ENERGY, RELATIVE_ERROR};
use vmc_kit::models::Jastrow;
use vmc_kit::{
    evaluate, exact_evaluate, ExactVariational, GradientDescent, Heisenberg, HilbertSpace, MetropolisParams,
    MetropolisSampler, Proposal, VariationalEstimator, VariationalMonteCarlo,
};

/// Ground-state energy of the 10-site ring with J = 1
const GROUND_STATE_ENERGY: f64 = -18.0617854180;

fn main() -> vmc_kit::Result<()> {
    println!("Heisenberg Ring VMC with Stochastic Reconfiguration");
    println!("===================================================\n");

    let hilbert = HilbertSpace::chain(10, true)?;
    let operator = Heisenberg { j: 1.0, sign_rule: true }.build(hilbert.clone());
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let mut model = Jastrow::random(10, true, true, 0.05, &mut rng)?;

    let params = MetropolisParams::new()
        .with_batch_size(1024)
        .with_n_chains(16)
        .with_burn_in(200)
        .with_decorrelation(2)
        .with_proposal(Proposal::Exchange)
        .with_seed(11);
    let sampler = MetropolisSampler::new(hilbert.clone(), params)?;
    let mut estimator: VariationalEstimator<_> = VariationalMonteCarlo::new(&operator, sampler).into();

    let optimizer = GradientDescent::new()
        .with_learning_rate(0.05)
        .with_iterations(150)
        .with_sr_epsilon(1e-3);

    let mut history = MetricsHistory::new();
    optimizer.run(&mut estimator, &mut model, &mut history)?;
    for (i, energy) in history.series(ENERGY).iter().enumerate().step_by(10) {
        println!("  iter {:4}  E = {:12.6}", i, energy);
    }

    let mc = evaluate(&mut estimator, &model, 200, default_callbacks(false, Some(GROUND_STATE_ENERGY)))?;
    let mut exact: VariationalEstimator<_> = ExactVariational::new(&operator, 1024)?.into();
    let reference = exact_evaluate(&mut exact, &model, default_callbacks(true, Some(GROUND_STATE_ENERGY)))?;

    println!("\nSummary:");
    println!("--------");
    println!("  Monte Carlo energy:  {:12.6}", mc[ENERGY]);
    println!("  Exact energy:        {:12.6}", reference[ENERGY]);
    println!("  Ground state:        {:12.6}", GROUND_STATE_ENERGY);
    println!("  Relative error:      {:12.6}", reference[RELATIVE_ERROR]);
    Ok(())
}
