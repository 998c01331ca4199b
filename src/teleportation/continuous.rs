// src/teleportation/continuous.rs

//! Hamiltonian-evolution realization of the protocol, optionally open.

use crate::core::{Operator, QuantumState, StateVector, TeleportError};
use crate::hamiltonians::{cz_hamiltonian, hadamard_correction, hadamard_hamiltonian};
use crate::operations::pauli_sum;
use crate::schedule::{Schedule, ScheduleBuilder, StageContext, TimedStage};
use crate::simulation::EvolutionOptions;
use crate::teleportation::TeleportationPipeline;
use crate::teleportation::topology::{GATE_DURATION, ProtocolStep, Topology};

/// Timed stage realizing one abstract step.
///
/// Hadamard and CZ steps run for the full gate duration π; a rotation by `θ`
/// evolves under `Σσ` for duration `θ`.
pub fn step_stage(num_qubits: usize, step: &ProtocolStep) -> Result<TimedStage, TeleportError> {
    let label = step.name();
    Ok(match *step {
        ProtocolStep::Hadamard(targets) => {
            TimedStage::new(label, hadamard_hamiltonian(num_qubits, targets)?, GATE_DURATION)
                .with_correction(hadamard_correction(num_qubits, targets)?)
        }
        ProtocolStep::ControlledZ { controls, targets } => {
            TimedStage::new(label, cz_hamiltonian(num_qubits, controls, targets)?, GATE_DURATION)
        }
        ProtocolStep::Rotation { axis, qubits, angle } => {
            TimedStage::new(label, pauli_sum(num_qubits, qubits, axis)?, angle)
        }
    })
}

/// Timed schedule for a list of steps, repeated `repetitions` times.
pub fn timed_schedule(
    num_qubits: usize,
    steps: &[ProtocolStep],
    repetitions: usize,
) -> Result<Schedule<TimedStage>, TeleportError> {
    let round = steps
        .iter()
        .map(|step| step_stage(num_qubits, step))
        .collect::<Result<Vec<_>, _>>()?;
    let mut builder = ScheduleBuilder::new();
    for _ in 0..repetitions {
        builder = builder.add_stages(round.iter().cloned());
    }
    Ok(builder.build())
}

/// The protocol as a sequence of timed Hamiltonian evolutions.
///
/// Jump operators given with [`ContinuousPipeline::with_dissipators`] act
/// during every stage, which turns every state after the first stage into a
/// density operator.
#[derive(Debug, Clone)]
pub struct ContinuousPipeline {
    topology: Topology,
    teleportation: Schedule<TimedStage>,
    xx_braiding: Schedule<TimedStage>,
    z_braiding: Schedule<TimedStage>,
    decoding: Schedule<TimedStage>,
    dissipators: Vec<Operator>,
    options: EvolutionOptions,
}

impl ContinuousPipeline {
    /// Closed-system pipeline for [`Topology::BRAIDING`].
    pub fn new() -> Result<Self, TeleportError> {
        Self::with_topology(Topology::BRAIDING)
    }

    /// Closed-system pipeline for an arbitrary layout.
    pub fn with_topology(topology: Topology) -> Result<Self, TeleportError> {
        let n = topology.num_qubits;
        Ok(Self {
            teleportation: timed_schedule(n, topology.teleportation, 1)?,
            xx_braiding: timed_schedule(n, topology.xx_braiding, topology.braid_repetitions)?,
            z_braiding: timed_schedule(n, topology.z_braiding, topology.braid_repetitions)?,
            decoding: timed_schedule(n, topology.decoding, 1)?,
            topology,
            dissipators: Vec::new(),
            options: EvolutionOptions::default(),
        })
    }

    /// Replaces the Lindblad jump operators.
    pub fn with_dissipators(mut self, dissipators: Vec<Operator>) -> Self {
        self.dissipators = dissipators;
        self
    }

    /// Replaces the integrator settings.
    pub fn with_options(mut self, options: EvolutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Current jump operators.
    pub fn dissipators(&self) -> &[Operator] {
        &self.dissipators
    }

    /// Current integrator settings.
    pub fn options(&self) -> &EvolutionOptions {
        &self.options
    }

    fn context(&self) -> StageContext<'_> {
        StageContext::open(&self.dissipators, self.options)
    }
}

impl TeleportationPipeline for ContinuousPipeline {
    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn teleport(&self, psi: &StateVector) -> Result<QuantumState, TeleportError> {
        let initial = QuantumState::Pure(self.topology.initial_state(psi)?);
        self.teleportation.run(initial, &self.context())
    }

    fn xx_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.xx_braiding.run(state, &self.context())
    }

    fn z_braiding(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.z_braiding.run(state, &self.context())
    }

    fn decode(&self, state: QuantumState) -> Result<QuantumState, TeleportError> {
        self.decoding.run(state, &self.context())
    }
}

/// Runs the Hamiltonian-evolution teleportation stage on `psi` under the
/// given jump operators and returns the 8-qubit state before any measurement.
pub fn continuous_teleportation(
    psi: &StateVector,
    dissipators: Vec<Operator>,
) -> Result<QuantumState, TeleportError> {
    ContinuousPipeline::new()?.with_dissipators(dissipators).teleport(psi)
}
