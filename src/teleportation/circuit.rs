// src/teleportation/circuit.rs

//! Gate-level realization of the protocol.

use crate::core::{Operator, QuantumState, StateVector, TeleportError};
use crate::operations::{Pauli, cz_gate, hadamard_gate, rx, ry, rz};
use crate::schedule::{Schedule, ScheduleBuilder, StageContext};
use crate::teleportation::TeleportationPipeline;
use crate::teleportation::topology::{ProtocolStep, Topology};

/// Gates realizing one abstract step.
pub fn step_gates(num_qubits: usize, step: &ProtocolStep) -> Result<Vec<Operator>, TeleportError> {
    match *step {
        ProtocolStep::Hadamard(targets) => targets.iter().map(|&t| hadamard_gate(num_qubits, t)).collect(),
        ProtocolStep::ControlledZ { controls, targets } => {
            if controls.len() != targets.len() {
                return Err(TeleportError::InvalidConfiguration {
                    message: format!("{} controls vs {} targets", controls.len(), targets.len()),
                });
            }
            controls.iter().zip(targets).map(|(&c, &t)| cz_gate(num_qubits, c, t)).collect()
        }
        ProtocolStep::Rotation { axis, qubits, angle } => qubits
            .iter()
            .map(|&q| match axis {
                Pauli::X => rx(angle, num_qubits, q),
                Pauli::Y => ry(angle, num_qubits, q),
                Pauli::Z => rz(angle, num_qubits, q),
                Pauli::I => Ok(Operator::identity(num_qubits)),
            })
            .collect(),
    }
}

/// Gate schedule for a list of steps, repeated `repetitions` times.
pub fn gate_schedule(
    num_qubits: usize,
    steps: &[ProtocolStep],
    repetitions: usize,
) -> Result<Schedule<Operator>, TeleportError> {
    let mut builder = ScheduleBuilder::new();
    for _ in 0..repetitions {
        for step in steps {
            builder = builder.add_stages(step_gates(num_qubits, step)?);
        }
    }
    Ok(builder.build())
}

/// The protocol as instantaneous gates.
#[derive(Debug, Clone)]
pub struct CircuitPipeline {
    topology: Topology,
    teleportation: Schedule<Operator>,
    xx_braiding: Schedule<Operator>,
    z_braiding: Schedule<Operator>,
    decoding: Schedule<Operator>,
}

impl CircuitPipeline {
    /// Pipeline for [`Topology::BRAIDING`].
    pub fn new() -> Result<Self, TeleportError> {
        Self::with_topology(Topology::BRAIDING)
    }

    /// Pipeline for an arbitrary layout.
    pub fn with_topology(topology: Topology) -> Result<Self, TeleportError> {
        let n = topology.num_qubits;
        Ok(Self {
            teleportation: gate_schedule(n, topology.teleportation, 1)?,
            xx_braiding: gate_schedule(n, topology.xx_braiding, topology.braid_repetitions)?,
            z_braiding: gate_schedule(n, topology.z_braiding, topology.braid_repetitions)?,
            decoding: gate_schedule(n, topology.decoding, 1)?,
            topology,
        })
    }
}

impl TeleportationPipeline for CircuitPipeline {
    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn teleport(&self, psi: &StateVector) -> Result<QuantumState, TeleportError> {
        let initial = QuantumState::Pure(self.topology.initial_state(psi)?);
        self.teleportation.run(initial, &StageContext::closed())
    }

    fn xx_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.xx_braiding.run(state, &StageContext::closed())
    }

    fn z_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.z_braiding.run(state, &StageContext::closed())
    }

    fn decode(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.decoding.run(state, &StageContext::closed())
    }
}

/// Runs the gate-level teleportation stage on `psi` and returns the 8-qubit
/// state before any measurement.
pub fn circuit_teleportation(psi: &StateVector) -> Result<QuantumState, TeleportError> {
    CircuitPipeline::new()?.teleport(psi)
}
