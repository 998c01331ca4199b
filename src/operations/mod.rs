// src/operations/mod.rs

//! Operator algebra on an N-qubit register.
//!
//! Local operators are embedded by padding with single-qubit identities and
//! taking the tensor product. The gate builders at the bottom give the circuit
//! realization of the protocol the same conventions as the continuous one:
//! `R_a(θ) = exp(-iθσ_a/2)` and `H = (X + Z)/√2`.

use nalgebra::Matrix2;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::f64::consts::FRAC_1_SQRT_2;

use crate::core::{Operator, TeleportError, tensor};

/// Single-qubit Pauli operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    /// Identity
    I,
    /// Bit flip
    X,
    /// Bit and phase flip
    Y,
    /// Phase flip
    Z,
}

impl Pauli {
    /// The 2x2 matrix of this Pauli operator.
    pub fn matrix(self) -> Matrix2<Complex<f64>> {
        let o = Complex::zero();
        let l = Complex::one();
        let i = Complex::i();
        match self {
            Pauli::I => Matrix2::new(l, o, o, l),
            Pauli::X => Matrix2::new(o, l, l, o),
            Pauli::Y => Matrix2::new(o, -i, i, o),
            Pauli::Z => Matrix2::new(l, o, o, -l),
        }
    }

    /// The single-qubit operator.
    pub fn operator(self) -> Operator {
        Operator::single(self.matrix())
    }
}

/// `|bit><bit|` on one qubit.
pub fn basis_projector(bit: u8) -> Operator {
    let o = Complex::zero();
    let l = Complex::one();
    if bit & 1 == 0 {
        Operator::single(Matrix2::new(l, o, o, o))
    } else {
        Operator::single(Matrix2::new(o, o, o, l))
    }
}

/// `num_qubits` single-qubit identities, the template into which local
/// operators are placed before taking the tensor product.
pub fn identity_padding(num_qubits: usize) -> Vec<Operator> {
    vec![Pauli::I.operator(); num_qubits]
}

fn check_qubit(num_qubits: usize, qubit: usize) -> Result<(), TeleportError> {
    if qubit >= num_qubits {
        return Err(TeleportError::QubitOutOfRange { qubit, num_qubits });
    }
    Ok(())
}

/// Places single-qubit operators at the given sites, identity elsewhere.
pub fn embed(num_qubits: usize, sites: &[(usize, Operator)]) -> Result<Operator, TeleportError> {
    let mut factors = identity_padding(num_qubits);
    for (qubit, op) in sites {
        check_qubit(num_qubits, *qubit)?;
        if op.num_qubits() != 1 {
            return Err(TeleportError::InvalidOperation {
                message: format!("Only single-qubit operators can be embedded, got {} qubits", op.num_qubits()),
            });
        }
        factors[*qubit] = op.clone();
    }
    tensor(&factors)
}

/// Pauli `kind` on qubit `qubit` of an `num_qubits` register.
pub fn single_qubit_operator(num_qubits: usize, qubit: usize, kind: Pauli) -> Result<Operator, TeleportError> {
    embed(num_qubits, &[(qubit, kind.operator())])
}

/// `X` on one qubit.
pub fn sigma_x(num_qubits: usize, qubit: usize) -> Result<Operator, TeleportError> {
    single_qubit_operator(num_qubits, qubit, Pauli::X)
}

/// `Y` on one qubit.
pub fn sigma_y(num_qubits: usize, qubit: usize) -> Result<Operator, TeleportError> {
    single_qubit_operator(num_qubits, qubit, Pauli::Y)
}

/// `Z` on one qubit.
pub fn sigma_z(num_qubits: usize, qubit: usize) -> Result<Operator, TeleportError> {
    single_qubit_operator(num_qubits, qubit, Pauli::Z)
}

/// Sum of a list of operators. The result is always an `Operator`, never a
/// scalar, so an empty list has no meaningful sum and is rejected.
pub fn weighted_sum<I>(terms: I) -> Result<Operator, TeleportError>
where
    I: IntoIterator<Item = Operator>,
{
    let mut terms = terms.into_iter();
    let first = terms.next().ok_or_else(|| TeleportError::InvalidOperation {
        message: "Cannot sum an empty list of operators".to_string(),
    })?;
    terms.try_fold(first, |acc, term| acc.checked_add(&term))
}

/// Sum of one Pauli kind over several qubits, e.g. `Σ_i Y_i`.
pub fn pauli_sum(num_qubits: usize, qubits: &[usize], kind: Pauli) -> Result<Operator, TeleportError> {
    let terms = qubits
        .iter()
        .map(|&q| single_qubit_operator(num_qubits, q, kind))
        .collect::<Result<Vec<_>, _>>()?;
    weighted_sum(terms)
}

// --- Gates for the circuit realization ---

/// Hadamard gate on `target`.
pub fn hadamard_gate(num_qubits: usize, target: usize) -> Result<Operator, TeleportError> {
    let h = Complex::new(FRAC_1_SQRT_2, 0.0);
    embed(num_qubits, &[(target, Operator::single(Matrix2::new(h, h, h, -h)))])
}

/// Controlled-Z between `control` and `target`.
pub fn cz_gate(num_qubits: usize, control: usize, target: usize) -> Result<Operator, TeleportError> {
    check_qubit(num_qubits, control)?;
    check_qubit(num_qubits, target)?;
    if control == target {
        return Err(TeleportError::InvalidConfiguration {
            message: format!("Control and target of a CZ gate must differ (both {control})"),
        });
    }
    // I - 2|11><11|
    let both_set = embed(num_qubits, &[(control, basis_projector(1)), (target, basis_projector(1))])?;
    Ok(Operator::identity(num_qubits) - both_set * 2.0)
}

fn rotation(kind: Pauli, theta: f64, num_qubits: usize, target: usize) -> Result<Operator, TeleportError> {
    let cos = Complex::new((theta / 2.0).cos(), 0.0);
    let minus_i_sin = Complex::new(0.0, -(theta / 2.0).sin());
    let r = Matrix2::<Complex<f64>>::identity() * cos + kind.matrix() * minus_i_sin;
    embed(num_qubits, &[(target, Operator::single(r))])
}

/// `R_x(θ) = exp(-iθX/2)` on `target`.
pub fn rx(theta: f64, num_qubits: usize, target: usize) -> Result<Operator, TeleportError> {
    rotation(Pauli::X, theta, num_qubits, target)
}

/// `R_y(θ) = exp(-iθY/2)` on `target`.
pub fn ry(theta: f64, num_qubits: usize, target: usize) -> Result<Operator, TeleportError> {
    rotation(Pauli::Y, theta, num_qubits, target)
}

/// `R_z(θ) = exp(-iθZ/2)` on `target`.
pub fn rz(theta: f64, num_qubits: usize, target: usize) -> Result<Operator, TeleportError> {
    rotation(Pauli::Z, theta, num_qubits, target)
}
