// src/teleportation/mod.rs

//! The braided teleportation protocol and its fidelity analysis.
//!
//! The protocol is written once, as data, in [`topology`]. [`circuit`] turns
//! it into gate schedules and [`continuous`] into timed Hamiltonian
//! evolutions (optionally with dephasing). [`fidelity`] drives either one
//! through both measurement rounds, and [`sweep`] repeats that over a range of
//! decay rates.

pub mod circuit;
pub mod continuous;
pub mod fidelity;
pub mod sweep;
pub mod topology;

use crate::core::{QuantumState, StateVector, TeleportError};

pub use circuit::{CircuitPipeline, circuit_teleportation};
pub use continuous::{ContinuousPipeline, continuous_teleportation};
pub use fidelity::{BranchCorrection, simulate_teleportation};
pub use sweep::{SweepTable, dephasing_dissipators, linspace, sweep_decay_rates};
pub use topology::{ProtocolStep, Topology};

/// One realization of the four protocol stages.
///
/// Implementations must be shareable across threads: branches of a run are
/// corrected and decoded concurrently when the `parallel` feature is on.
pub trait TeleportationPipeline: Sync {
    /// Layout the stages act on.
    fn topology(&self) -> &Topology;

    /// Embeds `psi` at the input slot and runs encoding and teleportation.
    fn teleport(&self, psi: &StateVector) -> Result<QuantumState, TeleportError>;

    /// XX braiding correction.
    fn xx_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError>;

    /// Z braiding correction.
    fn z_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError>;

    /// Final decoding.
    fn decode(&self, state: QuantumState) -> Result<QuantumState, TeleportError>;
}
