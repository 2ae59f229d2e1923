//! Single-spin-flip Metropolis Monte Carlo for the square-lattice Ising model.
//!
//! [`run`] sweeps a linear temperature grid. Every temperature point gets a
//! fresh random lattice and its own seeded generator, burns in, then measures
//! `⟨E⟩`, `⟨E²⟩` and `⟨M⟩` while keeping `E` and `M` up to date incrementally.
//! Specific heat is derived from the energy fluctuations once all points are
//! done.

pub mod config;
pub mod error;
pub mod geometry;
pub mod mcmc;
pub mod simulation;
pub mod spins;
pub mod statistics;

pub use config::SimConfig;
pub use error::SimError;
pub use geometry::{Lattice, Snapshot};
pub use mcmc::{ChainState, Metropolis};
pub use simulation::{run, run_temperature_point, run_with_progress, temperature_grid};
pub use statistics::{Observables, SweepResult, TemperaturePoint};
