use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::SimError;

fn default_coupling() -> f64 {
    1.0
}

fn default_boltzmann() -> f64 {
    1.0
}

fn validate_sim_config(cfg: &SimConfig) -> Result<(), ValidationError> {
    if cfg.lattice_size < 1 {
        return Err(ValidationError::new("lattice_size must be >= 1"));
    }
    if cfg.n_steps < 1 {
        return Err(ValidationError::new("n_steps must be >= 1"));
    }
    if cfg.n_temps < 1 {
        return Err(ValidationError::new("n_temps must be >= 1"));
    }
    if !cfg.coupling.is_finite() {
        return Err(ValidationError::new("coupling must be finite"));
    }
    if !(cfg.boltzmann.is_finite() && cfg.boltzmann > 0.0) {
        return Err(ValidationError::new("boltzmann must be finite and > 0"));
    }
    if !cfg.t_min.is_finite() || !cfg.t_max.is_finite() {
        return Err(ValidationError::new("t_min and t_max must be finite"));
    }
    if cfg.t_min <= 0.0 {
        return Err(ValidationError::new("t_min must be > 0"));
    }
    if cfg.t_max < cfg.t_min {
        return Err(ValidationError::new("t_max must be >= t_min"));
    }
    Ok(())
}

/// Parameters of one temperature sweep.
///
/// Step counts are in single proposed flips, not full lattice sweeps: one
/// lattice sweep of an `L×L` grid is `L²` steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_sim_config"))]
pub struct SimConfig {
    /// Side length `L` of the square lattice.
    pub lattice_size: usize,
    /// Nearest-neighbor coupling `J`.
    #[serde(default = "default_coupling")]
    pub coupling: f64,
    /// Boltzmann constant `kB` in simulation units.
    #[serde(default = "default_boltzmann")]
    pub boltzmann: f64,
    /// Measured steps per temperature point.
    pub n_steps: usize,
    /// Burn-in steps per temperature point, discarded.
    pub eq_steps: usize,
    /// Number of grid points between `t_min` and `t_max`, inclusive.
    pub n_temps: usize,
    pub t_min: f64,
    pub t_max: f64,
    /// Base seed. Drawn from the thread RNG when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Run temperature points on the calling thread instead of the rayon pool.
    #[serde(default)]
    pub sequential: bool,
}

impl SimConfig {
    /// Validate and convert failures into [`SimError::InvalidConfiguration`].
    pub fn check(&self) -> Result<(), SimError> {
        self.validate()
            .map_err(|e| SimError::InvalidConfiguration(format!("{e}")))
    }

    pub fn n_spins(&self) -> usize {
        self.lattice_size * self.lattice_size
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            lattice_size: 32,
            coupling: default_coupling(),
            boltzmann: default_boltzmann(),
            n_steps: 20_000,
            eq_steps: 10_000,
            n_temps: 20,
            t_min: 1.0,
            t_max: 5.0,
            seed: None,
            sequential: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rejected(cfg: SimConfig, param: &str) {
        match cfg.check() {
            Err(SimError::InvalidConfiguration(msg)) => {
                assert!(msg.contains(param), "message {msg:?} should name {param}")
            }
            other => panic!("expected InvalidConfiguration for {param}, got {other:?}"),
        }
    }

    #[test]
    fn default_is_valid() {
        assert!(SimConfig::default().check().is_ok());
    }

    #[test]
    fn rejects_each_bad_parameter() {
        let base = SimConfig::default();
        assert_rejected(SimConfig { lattice_size: 0, ..base.clone() }, "lattice_size");
        assert_rejected(SimConfig { n_steps: 0, ..base.clone() }, "n_steps");
        assert_rejected(SimConfig { n_temps: 0, ..base.clone() }, "n_temps");
        assert_rejected(SimConfig { t_min: 0.0, ..base.clone() }, "t_min");
        assert_rejected(SimConfig { t_min: -1.0, ..base.clone() }, "t_min");
        assert_rejected(SimConfig { t_min: 3.0, t_max: 2.0, ..base.clone() }, "t_max");
        assert_rejected(SimConfig { boltzmann: 0.0, ..base.clone() }, "boltzmann");
        assert_rejected(SimConfig { coupling: f64::NAN, ..base }, "coupling");
    }

    #[test]
    fn single_temperature_range_is_valid() {
        let cfg = SimConfig {
            t_min: 2.0,
            t_max: 2.0,
            n_temps: 1,
            eq_steps: 0,
            ..SimConfig::default()
        };
        assert!(cfg.check().is_ok());
    }
}
