pub mod results;
mod stats;

pub use results::{specific_heat, Observables, SweepResult, TemperaturePoint};
pub use stats::Statistics;
