use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ising_sim::{run_with_progress, SimConfig, SweepResult};

/// Metropolis temperature sweep of the 2D Ising model.
#[derive(Debug, Parser)]
#[command(name = "ising-sweep", version)]
struct Args {
    /// JSON file with a full configuration; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Lattice side length L.
    #[arg(short = 'L', long)]
    size: Option<usize>,
    /// Coupling J.
    #[arg(long)]
    coupling: Option<f64>,
    /// Boltzmann constant kB.
    #[arg(long)]
    kb: Option<f64>,
    /// Measured single-flip steps per temperature.
    #[arg(long)]
    n_steps: Option<usize>,
    /// Burn-in single-flip steps per temperature.
    #[arg(long)]
    eq_steps: Option<usize>,
    /// Number of temperatures.
    #[arg(long)]
    n_temps: Option<usize>,
    #[arg(long)]
    t_min: Option<f64>,
    #[arg(long)]
    t_max: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Run temperature points one after another on the main thread.
    #[arg(long)]
    sequential: bool,
    /// Print the full result as JSON instead of a table.
    #[arg(long)]
    json: bool,
    /// Print the snapshot nearest to this temperature (repeatable).
    #[arg(long = "show", value_name = "T")]
    show: Vec<f64>,
}

impl Args {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SimConfig::default(),
        };
        if let Some(v) = self.size {
            cfg.lattice_size = v;
        }
        if let Some(v) = self.coupling {
            cfg.coupling = v;
        }
        if let Some(v) = self.kb {
            cfg.boltzmann = v;
        }
        if let Some(v) = self.n_steps {
            cfg.n_steps = v;
        }
        if let Some(v) = self.eq_steps {
            cfg.eq_steps = v;
        }
        if let Some(v) = self.n_temps {
            cfg.n_temps = v;
        }
        if let Some(v) = self.t_min {
            cfg.t_min = v;
        }
        if let Some(v) = self.t_max {
            cfg.t_max = v;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg.sequential |= self.sequential;
        Ok(cfg)
    }
}

fn print_table(result: &SweepResult) {
    println!("seed {}", result.seed);
    println!(
        "{:>8}  {:>10}  {:>12}  {:>10}  {:>8}",
        "T", "<m>", "<E>", "C_v", "accept"
    );
    for p in &result.points {
        println!(
            "{:>8.4}  {:>10.5}  {:>12.3}  {:>10.5}  {:>8.4}",
            p.temperature,
            p.magnetization_per_spin,
            p.energy_avg,
            p.specific_heat,
            p.acceptance_rate
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.sim_config()?;

    let pb = ProgressBar::new(config.n_temps as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}]",
        )?
        .progress_chars("=> "),
    );
    pb.set_message("temperatures");

    let interrupted = AtomicBool::new(false);
    let result = run_with_progress(&config, &interrupted, &|_| pb.inc(1))?;
    pb.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_table(&result);
    }

    for &t in &args.show {
        if let Some(p) = result.nearest(t) {
            println!(
                "\nT = {:.4} (requested {t}), m = {:.4}",
                p.temperature,
                p.snapshot.magnetization_per_spin()
            );
            print!("{}", p.snapshot);
        }
    }
    Ok(())
}
