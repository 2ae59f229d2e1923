pub mod metropolis;

pub use metropolis::{acceptance_probability, ChainState, Metropolis};
