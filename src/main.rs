use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vmc_kit::evaluation::{default_callbacks, evaluate, exact_evaluate, Metrics, MetricsSink, ENERGY};
use vmc_kit::io::read_config;
use vmc_kit::models::Model;

#[derive(Parser, Debug)]
#[command(version, about = "Variational Monte Carlo on spin lattices", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Also evaluate the exact energy by full enumeration
    #[arg(long)]
    exact: bool,

    /// Override the number of evaluation steps
    #[arg(long)]
    steps: Option<usize>,
}

/// Advances a progress bar once per parameter update.
struct ProgressSink {
    bar: ProgressBar,
}

impl MetricsSink for ProgressSink {
    fn record(&mut self, _step: usize, metrics: &Metrics) {
        if let Some(energy) = metrics.get(ENERGY) {
            self.bar.set_message(format!("E = {:.6}", energy));
        }
        self.bar.inc(1);
    }
}

fn print_metrics(title: &str, metrics: &Metrics) {
    println!("{}", title);
    println!("{}", "-".repeat(title.len()));
    for (name, value) in metrics {
        println!("{:<32} {:>14.6}", name, value);
    }
    println!();
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    let mut config = read_config(&args.config)
        .with_context(|| format!("reading run configuration {}", args.config.display()))?;
    if let Some(steps) = args.steps {
        config.steps = steps;
    }

    let hilbert = config.hilbert_space()?;
    info!(shape = ?hilbert.shape(), pbc = hilbert.pbc(), sites = hilbert.n_sites(), "system");
    let mut model = config.build_model()?;
    let mut estimator = config.build_estimator(&model)?;

    if let Some(train) = &config.train {
        match &mut model {
            Model::Jastrow(jastrow) => {
                let bar = ProgressBar::new(train.iterations as u64);
                bar.set_style(ProgressStyle::with_template(
                    " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}",
                )?);
                let mut sink = ProgressSink { bar };
                let history = train.run(&mut estimator, jastrow, &mut sink)?;
                sink.bar.finish();
                if let (Some(first), Some(last)) = (history.energy_history.first(), history.energy_history.last()) {
                    info!(initial = first, last = last, "training finished");
                }
            }
            Model::Autoregressive(_) => warn!("the autoregressive model has no trainable interface, skipping training"),
        }
    }

    let callbacks = default_callbacks(estimator.is_exact(), config.true_ground_state_energy);
    let metrics = if estimator.is_exact() {
        exact_evaluate(&mut estimator, &model, callbacks)?
    } else {
        evaluate(&mut estimator, &model, config.steps, callbacks)?
    };
    print_metrics("Evaluation", &metrics);

    if args.exact && !estimator.is_exact() {
        let mut exact = config.build_exact_estimator()?;
        let exact_metrics = exact_evaluate(&mut exact, &model, default_callbacks(true, config.true_ground_state_energy))?;
        print_metrics("Exact evaluation", &exact_metrics);
    }

    Ok(())
}
