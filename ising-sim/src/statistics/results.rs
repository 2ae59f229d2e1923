use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::geometry::Snapshot;

/// Raw measurement-phase averages of a single temperature point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    pub temperature: f64,
    /// ⟨M⟩ / L².
    pub magnetization_per_spin: f64,
    /// ⟨E⟩ (total, not per spin).
    pub energy_avg: f64,
    /// ⟨E²⟩.
    pub energy2_avg: f64,
    /// Accepted / proposed flips during measurement.
    pub acceptance_rate: f64,
    /// Configuration copied at measurement step `n_steps / 2`.
    pub snapshot: Snapshot,
}

/// Per-temperature observables, one entry of a [`SweepResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observables {
    pub temperature: f64,
    pub magnetization_per_spin: f64,
    pub energy_avg: f64,
    pub energy2_avg: f64,
    /// `(⟨E²⟩ − ⟨E⟩²) / (kB T² L²)`.
    pub specific_heat: f64,
    pub acceptance_rate: f64,
    pub snapshot: Snapshot,
}

/// Outcome of a full sweep, ordered by increasing temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Base seed actually used; replaying with it reproduces this result.
    pub seed: u64,
    pub points: Vec<Observables>,
}

/// Energy-fluctuation estimator of the specific heat per spin.
///
/// Rounding can leave `⟨E²⟩ − ⟨E⟩²` a hair below zero when the energy barely
/// fluctuates; such residues are clamped to zero.
pub fn specific_heat(
    temperature: f64,
    energy_avg: f64,
    energy2_avg: f64,
    boltzmann: f64,
    n_spins: usize,
) -> f64 {
    let variance = energy2_avg - energy_avg * energy_avg;
    let variance = if variance < 0.0 {
        let tolerance = 1e-9 * energy2_avg.abs().max(1.0);
        if -variance > tolerance {
            warn!("negative energy variance {variance:e} at T = {temperature}, clamping to 0");
        }
        0.0
    } else {
        variance
    };
    variance / (boltzmann * temperature * temperature * n_spins as f64)
}

impl SweepResult {
    /// Reduce finished temperature points into observables.
    ///
    /// Each entry uses only its own point's averages.
    pub fn from_points(config: &SimConfig, seed: u64, points: Vec<TemperaturePoint>) -> Self {
        let n_spins = config.n_spins();
        let points = points
            .into_iter()
            .map(|p| Observables {
                specific_heat: specific_heat(
                    p.temperature,
                    p.energy_avg,
                    p.energy2_avg,
                    config.boltzmann,
                    n_spins,
                ),
                temperature: p.temperature,
                magnetization_per_spin: p.magnetization_per_spin,
                energy_avg: p.energy_avg,
                energy2_avg: p.energy2_avg,
                acceptance_rate: p.acceptance_rate,
                snapshot: p.snapshot,
            })
            .collect();
        Self { seed, points }
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }

    pub fn magnetizations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.magnetization_per_spin).collect()
    }

    pub fn energies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.energy_avg).collect()
    }

    pub fn specific_heats(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.specific_heat).collect()
    }

    /// Grid point whose temperature is closest to `temperature`.
    pub fn nearest(&self, temperature: f64) -> Option<&Observables> {
        self.points.iter().min_by(|a, b| {
            (a.temperature - temperature)
                .abs()
                .total_cmp(&(b.temperature - temperature).abs())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(temperature: f64, energy_avg: f64, energy2_avg: f64) -> TemperaturePoint {
        TemperaturePoint {
            temperature,
            magnetization_per_spin: 0.5,
            energy_avg,
            energy2_avg,
            acceptance_rate: 0.1,
            snapshot: Snapshot {
                size: 2,
                spins: vec![1, 1, -1, 1],
            },
        }
    }

    #[test]
    fn test_specific_heat_formula() {
        // variance 4, kB = 2, T = 2, N = 4 -> 4 / 32
        assert_relative_eq!(specific_heat(2.0, -10.0, 104.0, 2.0, 4), 0.125);
    }

    #[test]
    fn test_specific_heat_clamps_rounding() {
        assert_eq!(specific_heat(1.0, 0.1, 0.1 * 0.1 - 1e-18, 1.0, 4), 0.0);
        assert_eq!(specific_heat(1.0, -32.0, 1024.0, 1.0, 16), 0.0);
    }

    #[test]
    fn test_from_points_is_elementwise() {
        let config = SimConfig {
            lattice_size: 2,
            ..SimConfig::default()
        };
        let result = SweepResult::from_points(
            &config,
            7,
            vec![point(1.0, -8.0, 64.0), point(2.0, -4.0, 20.0)],
        );
        assert_eq!(result.seed, 7);
        assert_eq!(result.temperatures(), vec![1.0, 2.0]);
        assert_eq!(result.specific_heats()[0], 0.0);
        // variance 4 / (1 * 4 * 4)
        assert_relative_eq!(result.specific_heats()[1], 0.25);
        assert_eq!(result.magnetizations(), vec![0.5, 0.5]);
        assert_eq!(result.energies(), vec![-8.0, -4.0]);
    }

    #[test]
    fn test_nearest() {
        let config = SimConfig::default();
        let result = SweepResult::from_points(
            &config,
            0,
            vec![point(1.0, 0.0, 0.0), point(2.2, 0.0, 0.0), point(3.4, 0.0, 0.0)],
        );
        assert_eq!(result.nearest(2.3).unwrap().temperature, 2.2);
        assert_eq!(result.nearest(-5.0).unwrap().temperature, 1.0);
        assert_eq!(result.nearest(40.0).unwrap().temperature, 3.4);
        assert!(SweepResult::from_points(&config, 0, vec![]).nearest(1.0).is_none());
    }
}
