// src/simulation/mod.rs

//! Numerical machinery shared by both realizations of the protocol.
//!
//! [`engine`] evolves states in time (closed or open system), [`measurement`]
//! splits a state into projective-measurement branches, and [`results`] holds
//! the fidelity accumulators those branches feed.

pub mod engine;
pub mod measurement;
mod results;

// Re-export the main public interface types
pub use engine::{DEFAULT_RESOLUTION, EvolutionOptions, derive_unitary, evolve_state};
pub use measurement::{MeasurementOutcome, projective_measurement};
pub use results::{FidelityReport, FidelityTally};
