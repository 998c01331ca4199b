// src/teleportation/topology.rs

//! Qubit layout and stage layout of the braided teleportation protocol.
//!
//! Every qubit index the protocol touches lives in a [`Topology`]. The stage
//! lists are written once as abstract [`ProtocolStep`]s; the circuit and the
//! continuous pipelines each realize them in their own way, so the two can
//! never drift apart.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::core::{StateVector, TeleportError};
use crate::operations::Pauli;

/// One abstract step of the protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtocolStep {
    /// Hadamard on every listed qubit.
    Hadamard(&'static [usize]),
    /// Controlled-Z on each zipped control/target pair.
    ControlledZ {
        /// Control qubits.
        controls: &'static [usize],
        /// Target qubits, paired with `controls` by position.
        targets: &'static [usize],
    },
    /// `exp(-i angle σ/2)` on every listed qubit, `σ` given by `axis`.
    Rotation {
        /// Rotation axis.
        axis: Pauli,
        /// Rotated qubits.
        qubits: &'static [usize],
        /// Rotation angle. The continuous realization uses it as the stage duration.
        angle: f64,
    },
}

impl ProtocolStep {
    /// Short name used for stage labels.
    pub fn name(&self) -> String {
        match self {
            ProtocolStep::Hadamard(targets) => format!("H{targets:?}"),
            ProtocolStep::ControlledZ { controls, targets } => format!("CZ{controls:?}->{targets:?}"),
            ProtocolStep::Rotation { axis, qubits, angle } => format!("R{axis:?}({angle:.4}){qubits:?}"),
        }
    }
}

/// Qubit positions and stage lists of the protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topology {
    /// Register size.
    pub num_qubits: usize,
    /// Slot of the state to teleport in the initial register.
    pub input_slot: usize,
    /// Slot where the teleported state ends up after decoding.
    pub output_slot: usize,
    /// Encoding, teleportation and readout preparation.
    pub teleportation: &'static [ProtocolStep],
    /// One round of the XX braiding correction.
    pub xx_braiding: &'static [ProtocolStep],
    /// One round of the Z braiding correction.
    pub z_braiding: &'static [ProtocolStep],
    /// How often each braiding round is repeated.
    pub braid_repetitions: usize,
    /// Final decoding.
    pub decoding: &'static [ProtocolStep],
    /// Qubits measured right after teleportation.
    pub bell_qubits: &'static [usize],
    /// Qubits measured after decoding.
    pub output_qubits: &'static [usize],
    /// Positions of (c1, c2) within the first-round outcome bits.
    pub correction_bits: (usize, usize),
    /// First-round bit positions that must be zero for post-selection.
    pub discarded_bell_bits: &'static [usize],
    /// Second-round bit positions that must be zero for post-selection.
    pub discarded_output_bits: &'static [usize],
}

const BRAIDING_TELEPORTATION: &[ProtocolStep] = &[
    // encoding
    ProtocolStep::Hadamard(&[0, 1, 2, 3, 4, 5, 6, 7]),
    ProtocolStep::ControlledZ { controls: &[0, 2, 4], targets: &[1, 3, 5] },
    ProtocolStep::Hadamard(&[1, 3, 5]),
    // teleportation
    ProtocolStep::Rotation { axis: Pauli::Y, qubits: &[1, 2, 3, 4], angle: FRAC_PI_2 },
    ProtocolStep::Rotation { axis: Pauli::Z, qubits: &[1, 2, 3, 4], angle: -FRAC_PI_2 },
    ProtocolStep::ControlledZ { controls: &[1, 3], targets: &[2, 4] },
    ProtocolStep::Rotation { axis: Pauli::Y, qubits: &[1, 2, 3, 4], angle: -FRAC_PI_2 },
    // readout preparation
    ProtocolStep::Hadamard(&[1, 3]),
    ProtocolStep::ControlledZ { controls: &[0, 2], targets: &[1, 3] },
    ProtocolStep::Hadamard(&[0, 1, 2, 3]),
];

const BRAIDING_XX: &[ProtocolStep] = &[
    ProtocolStep::Rotation { axis: Pauli::Y, qubits: &[5, 6], angle: FRAC_PI_2 },
    ProtocolStep::Rotation { axis: Pauli::Z, qubits: &[5, 6], angle: -FRAC_PI_2 },
    ProtocolStep::ControlledZ { controls: &[5], targets: &[6] },
    ProtocolStep::Rotation { axis: Pauli::Y, qubits: &[5, 6], angle: -FRAC_PI_2 },
];

const BRAIDING_Z: &[ProtocolStep] = &[
    ProtocolStep::Rotation { axis: Pauli::X, qubits: &[4, 5], angle: FRAC_PI_2 },
    ProtocolStep::Rotation { axis: Pauli::Z, qubits: &[4, 5], angle: -FRAC_PI_2 },
    ProtocolStep::ControlledZ { controls: &[4], targets: &[5] },
    ProtocolStep::Rotation { axis: Pauli::X, qubits: &[4, 5], angle: -FRAC_PI_2 },
];

const BRAIDING_DECODING: &[ProtocolStep] = &[
    ProtocolStep::Hadamard(&[5, 7]),
    ProtocolStep::ControlledZ { controls: &[4, 6], targets: &[5, 7] },
    ProtocolStep::Hadamard(&[4, 5, 6]),
];

impl Topology {
    /// The 8-qubit braided teleportation layout.
    pub const BRAIDING: Topology = Topology {
        num_qubits: 8,
        input_slot: 1,
        output_slot: 5,
        teleportation: BRAIDING_TELEPORTATION,
        xx_braiding: BRAIDING_XX,
        z_braiding: BRAIDING_Z,
        braid_repetitions: 2,
        decoding: BRAIDING_DECODING,
        bell_qubits: &[0, 1, 2, 3],
        output_qubits: &[4, 6, 7],
        correction_bits: (1, 3),
        discarded_bell_bits: &[0, 2],
        discarded_output_bits: &[0, 1],
    };

    /// Measurement mask flagging `qubits`.
    pub fn mask(&self, qubits: &[usize]) -> Vec<bool> {
        (0..self.num_qubits).map(|q| qubits.contains(&q)).collect()
    }

    /// `|0 ψ 0 ... 0>` with `psi` at the input slot.
    pub fn initial_state(&self, psi: &StateVector) -> Result<StateVector, TeleportError> {
        self.check_input(psi)?;
        let factors: Vec<StateVector> = (0..self.num_qubits)
            .map(|q| if q == self.input_slot { psi.clone() } else { StateVector::basis(0) })
            .collect();
        StateVector::tensor(&factors)
    }

    /// The ideal final state of a branch: measured qubits in the observed
    /// basis states and `psi` at the output slot.
    pub fn expected_state(
        &self,
        bell_bits: &[u8],
        output_bits: &[u8],
        psi: &StateVector,
    ) -> Result<StateVector, TeleportError> {
        self.check_input(psi)?;
        if bell_bits.len() != self.bell_qubits.len() || output_bits.len() != self.output_qubits.len() {
            return Err(TeleportError::InvalidOperation {
                message: format!(
                    "Expected {} + {} outcome bits, got {} + {}",
                    self.bell_qubits.len(),
                    self.output_qubits.len(),
                    bell_bits.len(),
                    output_bits.len()
                ),
            });
        }
        let factors = (0..self.num_qubits)
            .map(|q| {
                if let Some(i) = self.bell_qubits.iter().position(|&b| b == q) {
                    Ok(StateVector::basis(bell_bits[i]))
                } else if let Some(i) = self.output_qubits.iter().position(|&o| o == q) {
                    Ok(StateVector::basis(output_bits[i]))
                } else if q == self.output_slot {
                    Ok(psi.clone())
                } else {
                    Err(TeleportError::InvalidConfiguration {
                        message: format!("Qubit {q} is neither measured nor the output slot"),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        StateVector::tensor(&factors)
    }

    /// `true` when every discarded bit of both rounds is zero.
    pub fn is_post_selected(&self, bell_bits: &[u8], output_bits: &[u8]) -> bool {
        let clear = |bits: &[u8], positions: &[usize]| positions.iter().all(|&p| bits.get(p) == Some(&0));
        clear(bell_bits, self.discarded_bell_bits) && clear(output_bits, self.discarded_output_bits)
    }

    fn check_input(&self, psi: &StateVector) -> Result<(), TeleportError> {
        if psi.num_qubits() != 1 {
            return Err(TeleportError::InvalidConfiguration {
                message: format!("Only a single qubit can be teleported, got {} qubits", psi.num_qubits()),
            });
        }
        Ok(())
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::BRAIDING
    }
}

/// Full angle of a Hadamard or CZ stage.
pub(crate) const GATE_DURATION: f64 = PI;
