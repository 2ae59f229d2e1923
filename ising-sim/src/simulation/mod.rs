mod grid;

pub use grid::{point_seed, temperature_grid};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::geometry::Lattice;
use crate::mcmc::{ChainState, Metropolis};
use crate::statistics::{Statistics, SweepResult, TemperaturePoint};

/// Run one temperature point on a fresh random lattice.
///
/// 1. `eq_steps` proposed flips, discarded.
/// 2. `n_steps` proposed flips, each followed by accumulating `E`, `E²` and `M`.
///    The lattice is copied after measurement step `n_steps / 2`.
///
/// `config` is assumed valid; [`run`] checks it before calling this.
pub fn run_temperature_point(
    config: &SimConfig,
    temperature: f64,
    rng: &mut Xoshiro256StarStar,
) -> Result<TemperaturePoint, SimError> {
    let mut lattice = Lattice::random(config.lattice_size, rng)?;
    let mut state = ChainState::from_lattice(&lattice, config.coupling);
    let sampler = Metropolis::new(config.coupling, config.boltzmann, temperature);

    for _ in 0..config.eq_steps {
        sampler.step(&mut lattice, &mut state, rng)?;
    }
    state.reset_counters();

    let mut energies_stat = Statistics::new(1);
    let mut energies2_stat = Statistics::new(2);
    let mut mags_stat = Statistics::new(1);
    let snapshot_step = config.n_steps / 2;
    let mut snapshot = None;

    for step in 0..config.n_steps {
        sampler.step(&mut lattice, &mut state, rng)?;

        energies_stat.update(state.energy);
        energies2_stat.update(state.energy);
        mags_stat.update(state.magnetization as f64);

        if step == snapshot_step {
            snapshot = Some(lattice.snapshot());
        }
    }

    let energy2_avg = energies2_stat.average();
    if !energy2_avg.is_finite() {
        return Err(SimError::NumericInstability {
            temperature,
            detail: format!("<E^2> accumulated to {energy2_avg}"),
        });
    }

    Ok(TemperaturePoint {
        temperature,
        magnetization_per_spin: mags_stat.average() / lattice.n_spins as f64,
        energy_avg: energies_stat.average(),
        energy2_avg,
        acceptance_rate: state.acceptance_rate(),
        // n_steps >= 1 puts the snapshot step inside the loop
        snapshot: snapshot.unwrap_or_else(|| lattice.snapshot()),
    })
}

/// Run the full temperature sweep described by `config`.
pub fn run(config: &SimConfig) -> Result<SweepResult, SimError> {
    run_with_progress(config, &AtomicBool::new(false), &|_| {})
}

/// [`run`] with cancellation and a per-point callback.
///
/// `interrupted` is checked before each temperature point starts; a chain in
/// progress always finishes. `on_point` is called once per finished point,
/// possibly from a rayon worker and out of temperature order.
///
/// Point `t` samples with its own `Xoshiro256StarStar` seeded from
/// [`point_seed`], so the result does not depend on `config.sequential`.
pub fn run_with_progress(
    config: &SimConfig,
    interrupted: &AtomicBool,
    on_point: &(dyn Fn(&TemperaturePoint) + Sync),
) -> Result<SweepResult, SimError> {
    config.check()?;

    let temps = temperature_grid(config.t_min, config.t_max, config.n_temps);
    let base_seed = config
        .seed
        .unwrap_or_else(|| rand::thread_rng().gen::<u64>());

    info!(
        "sweeping {} temperature(s) in [{}, {}] on a {}x{} lattice, seed {}",
        temps.len(),
        config.t_min,
        config.t_max,
        config.lattice_size,
        config.lattice_size,
        base_seed
    );

    let completed = AtomicUsize::new(0);
    let work = |(t, &temperature): (usize, &f64)| -> Result<TemperaturePoint, SimError> {
        if interrupted.load(Ordering::Relaxed) {
            return Err(SimError::Interrupted {
                completed: completed.load(Ordering::Relaxed),
            });
        }
        let mut rng = Xoshiro256StarStar::seed_from_u64(point_seed(base_seed, t));
        let point = run_temperature_point(config, temperature, &mut rng)?;
        debug!(
            "T = {:.4}: <m> = {:.4}, <E> = {:.3}, acceptance = {:.3}",
            point.temperature, point.magnetization_per_spin, point.energy_avg, point.acceptance_rate
        );
        completed.fetch_add(1, Ordering::Relaxed);
        on_point(&point);
        Ok(point)
    };

    let points: Vec<TemperaturePoint> = if config.sequential {
        temps.iter().enumerate().map(work).collect::<Result<_, _>>()?
    } else {
        temps.par_iter().enumerate().map(work).collect::<Result<_, _>>()?
    };

    let result = SweepResult::from_points(config, base_seed, points);
    info!("sweep finished: {} point(s)", result.points.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spins::energy::{magnetization, total_energy};

    fn small_config() -> SimConfig {
        SimConfig {
            lattice_size: 4,
            n_steps: 500,
            eq_steps: 100,
            n_temps: 3,
            t_min: 1.0,
            t_max: 3.0,
            seed: Some(17),
            sequential: true,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_fails_before_sampling() {
        let calls = AtomicUsize::new(0);
        let config = SimConfig {
            t_max: 0.5,
            ..small_config()
        };
        let err = run_with_progress(&config, &AtomicBool::new(false), &|_| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(ref m) if m.contains("t_max")));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_point_averages_and_snapshot() {
        let config = small_config();
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let point = run_temperature_point(&config, 2.0, &mut rng).unwrap();

        assert_eq!(point.temperature, 2.0);
        assert!(point.magnetization_per_spin.abs() <= 1.0);
        // E lies in [-2N, 2N] for N = 16
        assert!(point.energy_avg >= -32.0 && point.energy_avg <= 32.0);
        assert!(point.energy2_avg >= point.energy_avg * point.energy_avg - 1e-9);
        assert!(point.acceptance_rate > 0.0 && point.acceptance_rate <= 1.0);
        assert_eq!(point.snapshot.size, 4);
        assert!(point.snapshot.spins.iter().all(|&s| s == 1 || s == -1));
    }

    #[test]
    fn test_single_step_measurement_snapshot() {
        // n_steps = 1: snapshot step 0 is the only measured step
        let config = SimConfig {
            n_steps: 1,
            eq_steps: 0,
            ..small_config()
        };
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        let point = run_temperature_point(&config, 1.5, &mut rng).unwrap();
        let e = point.energy_avg;
        assert_eq!(point.energy2_avg, e * e);

        let mut replay = Xoshiro256StarStar::seed_from_u64(2);
        let mut lattice = Lattice::random(4, &mut replay).unwrap();
        let mut state = ChainState::from_lattice(&lattice, 1.0);
        Metropolis::new(1.0, 1.0, 1.5)
            .step(&mut lattice, &mut state, &mut replay)
            .unwrap();
        assert_eq!(point.snapshot, lattice.snapshot());
        assert_eq!(e, total_energy(&lattice, 1.0));
        assert_eq!(
            point.magnetization_per_spin,
            magnetization(&lattice) as f64 / 16.0
        );
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let sequential = run(&small_config()).unwrap();
        let parallel = run(&SimConfig {
            sequential: false,
            ..small_config()
        })
        .unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.temperatures(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_interrupt_before_start() {
        let flag = AtomicBool::new(true);
        let err = run_with_progress(&small_config(), &flag, &|_| {}).unwrap_err();
        assert!(matches!(err, SimError::Interrupted { completed: 0 }));
    }

    #[test]
    fn test_interrupt_between_points() {
        let flag = AtomicBool::new(false);
        let err = run_with_progress(&small_config(), &flag, &|_| {
            flag.store(true, Ordering::Relaxed);
        })
        .unwrap_err();
        assert!(matches!(err, SimError::Interrupted { completed: 1 }));
    }

    #[test]
    fn test_unseeded_run_reports_seed() {
        let config = SimConfig {
            seed: None,
            ..small_config()
        };
        let first = run(&config).unwrap();
        let replay = run(&SimConfig {
            seed: Some(first.seed),
            ..config
        })
        .unwrap();
        assert_eq!(first, replay);
    }
}
