// src/hamiltonians/mod.rs

//! Hamiltonians whose evolution realizes Hadamard and controlled-Z gates.
//!
//! Evolving under [`hadamard_hamiltonian`] for a half-period (π/2) gives
//! `-i·H` on every target; [`hadamard_correction`] removes the `-i`. Evolving
//! under [`cz_hamiltonian`] for the same half-period gives the CZ gate exactly.

use nalgebra::Matrix2;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::core::{Operator, TeleportError};
use crate::operations::{Pauli, embed, single_qubit_operator, weighted_sum};
use crate::simulation::derive_unitary;

/// `Σ_{i∈targets} (X_i + Z_i)/√2`.
pub fn hadamard_hamiltonian(num_qubits: usize, targets: &[usize]) -> Result<Operator, TeleportError> {
    let terms = targets
        .iter()
        .map(|&i| {
            let x = single_qubit_operator(num_qubits, i, Pauli::X)?;
            let z = single_qubit_operator(num_qubits, i, Pauli::Z)?;
            Ok((x + z) * FRAC_1_SQRT_2)
        })
        .collect::<Result<Vec<_>, TeleportError>>()?;
    weighted_sum(terms)
}

/// Corrective unitary for [`hadamard_hamiltonian`]: the single-qubit identity
/// evolved by angle `-π` (a global `i` phase) on every target, identity
/// elsewhere.
pub fn hadamard_correction(num_qubits: usize, targets: &[usize]) -> Result<Operator, TeleportError> {
    let phase = derive_unitary(&Pauli::I.operator(), -PI);
    let sites: Vec<(usize, Operator)> = targets.iter().map(|&i| (i, phase.clone())).collect();
    embed(num_qubits, &sites)
}

/// `Σ_pairs [(I − Z)/2]_control ⊗ [Z − I]_target`.
///
/// `controls` and `targets` are zipped pairwise and must have the same,
/// non-zero length.
pub fn cz_hamiltonian(num_qubits: usize, controls: &[usize], targets: &[usize]) -> Result<Operator, TeleportError> {
    if controls.len() != targets.len() {
        return Err(TeleportError::InvalidConfiguration {
            message: format!(
                "CZ Hamiltonian needs paired qubits: {} controls vs {} targets",
                controls.len(),
                targets.len()
            ),
        });
    }
    if controls.is_empty() {
        return Err(TeleportError::InvalidConfiguration {
            message: "CZ Hamiltonian needs at least one control/target pair".to_string(),
        });
    }

    let o = Complex::zero();
    let l = Complex::one();
    // (I - Z)/2 = |1><1|
    let control_term = Operator::single(Matrix2::new(o, o, o, l));
    // Z - I = -2|1><1|
    let target_term = Operator::single(Matrix2::new(o, o, o, -l - l));

    let terms = controls
        .iter()
        .zip(targets)
        .map(|(&c, &t)| {
            if c == t {
                return Err(TeleportError::InvalidConfiguration {
                    message: format!("Control and target of a CZ pair must differ (both {c})"),
                });
            }
            embed(num_qubits, &[(c, control_term.clone()), (t, target_term.clone())])
        })
        .collect::<Result<Vec<_>, _>>()?;
    weighted_sum(terms)
}
