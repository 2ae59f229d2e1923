use rand::Rng;

use crate::error::SimError;
use crate::geometry::Lattice;
use crate::spins::energy::{delta_energy, magnetization, total_energy};

/// Running totals carried along one Markov chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainState {
    /// Total energy `E`, updated by `dE` on every accepted flip.
    pub energy: f64,
    /// Total magnetization `M`, updated by `-2 * spin_before`.
    pub magnetization: i64,
    pub proposed: u64,
    pub accepted: u64,
}

impl ChainState {
    /// Compute `E` and `M` from scratch.
    pub fn from_lattice(lattice: &Lattice, coupling: f64) -> Self {
        Self {
            energy: total_energy(lattice, coupling),
            magnetization: magnetization(lattice),
            proposed: 0,
            accepted: 0,
        }
    }

    /// Recompute `E` and `M` and return `(energy drift, magnetization drift)`
    /// relative to the running values.
    pub fn verify(&self, lattice: &Lattice, coupling: f64) -> (f64, i64) {
        let fresh = Self::from_lattice(lattice, coupling);
        (
            self.energy - fresh.energy,
            self.magnetization - fresh.magnetization,
        )
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        self.proposed = 0;
        self.accepted = 0;
    }
}

/// Boltzmann acceptance probability `min(1, exp(-dE / kBT))`.
///
/// A non-negative exponent returns `1.0` without calling `exp`, which also
/// covers `dE <= 0` at `kBT -> 0`. Returns `None` if the exponent is NaN.
#[inline]
pub fn acceptance_probability(d_e: f64, kb_t: f64) -> Option<f64> {
    let exponent = -d_e / kb_t;
    if exponent.is_nan() {
        return None;
    }
    if exponent >= 0.0 {
        return Some(1.0);
    }
    Some(exponent.exp())
}

/// Single-spin-flip Metropolis sampler at a fixed temperature.
#[derive(Debug, Clone, Copy)]
pub struct Metropolis {
    pub coupling: f64,
    pub temperature: f64,
    kb_t: f64,
}

impl Metropolis {
    pub fn new(coupling: f64, boltzmann: f64, temperature: f64) -> Self {
        Self {
            coupling,
            temperature,
            kb_t: boltzmann * temperature,
        }
    }

    /// One proposed flip at a uniformly chosen site. Returns whether it was
    /// accepted.
    pub fn step<R: Rng>(
        &self,
        lattice: &mut Lattice,
        state: &mut ChainState,
        rng: &mut R,
    ) -> Result<bool, SimError> {
        let i = rng.gen_range(0..lattice.size);
        let j = rng.gen_range(0..lattice.size);
        self.step_at(lattice, state, i, j, || rng.gen::<f64>())
    }

    /// One proposed flip at `(i, j)`.
    ///
    /// `draw` yields the uniform `[0, 1)` variate and is only called when the
    /// flip does not lower the energy.
    pub fn step_at(
        &self,
        lattice: &mut Lattice,
        state: &mut ChainState,
        i: usize,
        j: usize,
        draw: impl FnOnce() -> f64,
    ) -> Result<bool, SimError> {
        state.proposed += 1;
        let d_e = delta_energy(lattice, i, j, self.coupling);

        let accept = if d_e < 0.0 {
            true
        } else {
            let p = acceptance_probability(d_e, self.kb_t).ok_or_else(|| {
                SimError::NumericInstability {
                    temperature: self.temperature,
                    detail: format!("acceptance exponent is NaN for dE = {d_e}"),
                }
            })?;
            p >= 1.0 || draw() < p
        };

        if !accept {
            return Ok(false);
        }

        let energy = state.energy + d_e;
        if !energy.is_finite() {
            return Err(SimError::NumericInstability {
                temperature: self.temperature,
                detail: format!("energy became {energy} after dE = {d_e}"),
            });
        }

        let spin_before = lattice.spin(i, j);
        lattice.flip(i, j);
        state.energy = energy;
        state.magnetization -= 2 * spin_before as i64;
        state.accepted += 1;
        Ok(true)
    }
}
