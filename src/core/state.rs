// src/core/state.rs

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use num_traits::{One, Zero};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::{Operator, TeleportError};

/// A pure state of an N-qubit register.
///
/// Amplitudes are kept exactly as produced: projections leave the norm below
/// one and that norm is the weight of the branch, so nothing here renormalizes
/// implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: DVector<Complex<f64>>,
}

impl StateVector {
    /// Wraps an amplitude vector whose length must be a power of two.
    pub fn new(amplitudes: Vec<Complex<f64>>) -> Result<Self, TeleportError> {
        Self::from_vector(DVector::from_vec(amplitudes))
    }

    /// Wraps an amplitude column whose length must be a power of two.
    pub fn from_vector(amplitudes: DVector<Complex<f64>>) -> Result<Self, TeleportError> {
        let len = amplitudes.len();
        if len == 0 || !len.is_power_of_two() {
            return Err(TeleportError::InvalidConfiguration {
                message: format!("State vector length {len} is not a non-zero power of two"),
            });
        }
        Ok(Self { num_qubits: len.trailing_zeros() as usize, amplitudes })
    }

    /// Single-qubit computational basis state `|bit>`.
    pub fn basis(bit: u8) -> Self {
        let mut amplitudes = DVector::zeros(2);
        amplitudes[usize::from(bit & 1)] = Complex::one();
        Self { num_qubits: 1, amplitudes }
    }

    /// Tensor product of the given states, first entry most significant.
    pub fn tensor(factors: &[StateVector]) -> Result<Self, TeleportError> {
        let (first, rest) = factors.split_first().ok_or_else(|| TeleportError::InvalidOperation {
            message: "Cannot form the tensor product of an empty state list".to_string(),
        })?;
        Ok(rest.iter().fold(first.clone(), |acc, s| StateVector {
            num_qubits: acc.num_qubits + s.num_qubits,
            amplitudes: acc.amplitudes.kronecker(&s.amplitudes),
        }))
    }

    /// Read-only access to the amplitudes.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        self.amplitudes.as_slice()
    }

    /// The amplitudes as a column vector.
    pub fn vector(&self) -> &DVector<Complex<f64>> {
        &self.amplitudes
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert-space dimension.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.amplitudes.norm()
    }

    /// Inner product `<self|other>`.
    pub fn inner(&self, other: &StateVector) -> Result<Complex<f64>, TeleportError> {
        if self.dim() != other.dim() {
            return Err(TeleportError::dimension_mismatch(self.dim(), other.dim(), "inner product"));
        }
        Ok(self.amplitudes.dotc(&other.amplitudes))
    }

    /// Copy scaled to unit norm. A zero vector is returned unchanged.
    pub fn unit(&self) -> StateVector {
        let norm = self.norm();
        if norm > 0.0 { self.scaled(1.0 / norm) } else { self.clone() }
    }

    fn scaled(&self, factor: f64) -> StateVector {
        StateVector {
            num_qubits: self.num_qubits,
            amplitudes: self.amplitudes.map(|a| a * factor),
        }
    }

    /// Outer product `|ψ><ψ|` as a density matrix.
    pub fn to_density(&self) -> DensityMatrix {
        DensityMatrix { num_qubits: self.num_qubits, matrix: &self.amplitudes * self.amplitudes.adjoint() }
    }

    pub(crate) fn from_raw(num_qubits: usize, amplitudes: DVector<Complex<f64>>) -> Self {
        Self { num_qubits, amplitudes }
    }
}

/// A mixed state stored as a dense `2^N x 2^N` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    num_qubits: usize,
    matrix: DMatrix<Complex<f64>>,
}

impl DensityMatrix {
    /// Wraps a square matrix whose side must be a power of two.
    pub fn new(matrix: DMatrix<Complex<f64>>) -> Result<Self, TeleportError> {
        let (rows, cols) = matrix.shape();
        if rows == 0 || rows != cols || !rows.is_power_of_two() {
            return Err(TeleportError::InvalidConfiguration {
                message: format!("A {rows}x{cols} matrix is not a 2^N x 2^N density matrix"),
            });
        }
        Ok(Self { num_qubits: rows.trailing_zeros() as usize, matrix })
    }

    /// Read-only access to the matrix.
    pub fn matrix(&self) -> &DMatrix<Complex<f64>> {
        &self.matrix
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Side length of the matrix.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Matrix element `ρ[r][c]`.
    pub fn get(&self, r: usize, c: usize) -> Complex<f64> {
        self.matrix[(r, c)]
    }

    /// Trace of the matrix.
    pub fn trace(&self) -> Complex<f64> {
        self.matrix.trace()
    }

    /// Purity `tr(ρ²)`.
    pub fn purity(&self) -> f64 {
        // For Hermitian ρ, tr(ρ²) = Σ |ρ_ij|²
        self.matrix.iter().map(|c| c.norm_sqr()).sum()
    }

    /// `<e|ρ|e>` for a pure reference state `e`.
    pub fn expectation(&self, e: &StateVector) -> Result<Complex<f64>, TeleportError> {
        if e.dim() != self.dim() {
            return Err(TeleportError::dimension_mismatch(self.dim(), e.dim(), "expectation value"));
        }
        Ok(e.vector().dotc(&(&self.matrix * e.vector())))
    }

    /// Copy with every element between different outcome blocks set to zero.
    ///
    /// `block_of` maps a basis index to its block; two indices in the same
    /// block keep their coherence.
    pub fn block_diagonal<F>(&self, block_of: F) -> DensityMatrix
    where
        F: Fn(usize) -> usize,
    {
        let dim = self.dim();
        let matrix = DMatrix::from_fn(dim, dim, |r, c| {
            if block_of(r) == block_of(c) { self.matrix[(r, c)] } else { Complex::zero() }
        });
        DensityMatrix { num_qubits: self.num_qubits, matrix }
    }

    fn scaled(&self, factor: f64) -> DensityMatrix {
        DensityMatrix { num_qubits: self.num_qubits, matrix: self.matrix.map(|a| a * factor) }
    }

    /// `A·ρ·B` for sparse `A` and `B`.
    fn sandwich(&self, left: &Operator, right: &Operator) -> DensityMatrix {
        DensityMatrix { num_qubits: self.num_qubits, matrix: right.right_mul(&left.left_mul(&self.matrix)) }
    }

    pub(crate) fn from_raw(num_qubits: usize, matrix: DMatrix<Complex<f64>>) -> Self {
        Self { num_qubits, matrix }
    }
}

/// The state of the register at any point of a schedule.
///
/// The variant decides which formula a correction, projection, weight or
/// fidelity uses; callers never inspect shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantumState {
    /// A state vector.
    Pure(StateVector),
    /// A density operator.
    Mixed(DensityMatrix),
}

impl QuantumState {
    /// Number of qubits in the register.
    pub fn num_qubits(&self) -> usize {
        match self {
            QuantumState::Pure(psi) => psi.num_qubits(),
            QuantumState::Mixed(rho) => rho.num_qubits(),
        }
    }

    /// Hilbert-space dimension.
    pub fn dim(&self) -> usize {
        1 << self.num_qubits()
    }

    /// `true` for the density-operator variant.
    pub fn is_mixed(&self) -> bool {
        matches!(self, QuantumState::Mixed(_))
    }

    /// Branch weight: the Euclidean norm of a vector, the (real) trace of a
    /// density operator.
    pub fn weight(&self) -> f64 {
        match self {
            QuantumState::Pure(psi) => psi.norm(),
            QuantumState::Mixed(rho) => rho.trace().re,
        }
    }

    /// Promotes to the density-operator form (no-op for mixed states).
    pub fn into_density(self) -> DensityMatrix {
        match self {
            QuantumState::Pure(psi) => psi.to_density(),
            QuantumState::Mixed(rho) => rho,
        }
    }

    fn check_operator(&self, op: &Operator, context: &str) -> Result<(), TeleportError> {
        if op.dim() != self.dim() {
            return Err(TeleportError::dimension_mismatch(self.dim(), op.dim(), context));
        }
        Ok(())
    }

    /// Action of a gate: `Uψ` on a vector, `UρU†` on a density operator.
    pub fn apply_unitary(&self, u: &Operator) -> Result<QuantumState, TeleportError> {
        self.check_operator(u, "unitary stage")?;
        Ok(match self {
            QuantumState::Pure(psi) => {
                QuantumState::Pure(StateVector::from_raw(psi.num_qubits(), u.apply_to(psi.vector())))
            }
            QuantumState::Mixed(rho) => QuantumState::Mixed(rho.sandwich(u, &u.dagger())),
        })
    }

    /// Corrective unitary after a timed stage: `Uψ` on a vector, `U†ρU` on a
    /// density operator.
    pub fn correct(&self, u: &Operator) -> Result<QuantumState, TeleportError> {
        self.check_operator(u, "stage correction")?;
        Ok(match self {
            QuantumState::Pure(psi) => {
                QuantumState::Pure(StateVector::from_raw(psi.num_qubits(), u.apply_to(psi.vector())))
            }
            QuantumState::Mixed(rho) => QuantumState::Mixed(rho.sandwich(&u.dagger(), u)),
        })
    }

    /// Projection: `Pψ` on a vector, `PρP` on a density operator.
    pub fn project(&self, p: &Operator) -> Result<QuantumState, TeleportError> {
        self.check_operator(p, "projection")?;
        Ok(match self {
            QuantumState::Pure(psi) => {
                QuantumState::Pure(StateVector::from_raw(psi.num_qubits(), p.apply_to(psi.vector())))
            }
            QuantumState::Mixed(rho) => QuantumState::Mixed(rho.sandwich(p, p)),
        })
    }

    /// Copy divided by `factor`.
    pub fn divided_by(&self, factor: f64) -> QuantumState {
        match self {
            QuantumState::Pure(psi) => QuantumState::Pure(psi.scaled(1.0 / factor)),
            QuantumState::Mixed(rho) => QuantumState::Mixed(rho.scaled(1.0 / factor)),
        }
    }

    /// Elementwise sum of two states of the same kind and size.
    pub fn checked_add(&self, other: &QuantumState) -> Result<QuantumState, TeleportError> {
        if self.dim() != other.dim() {
            return Err(TeleportError::dimension_mismatch(self.dim(), other.dim(), "state sum"));
        }
        match (self, other) {
            (QuantumState::Pure(a), QuantumState::Pure(b)) => {
                Ok(QuantumState::Pure(StateVector::from_raw(a.num_qubits(), &a.amplitudes + &b.amplitudes)))
            }
            (QuantumState::Mixed(a), QuantumState::Mixed(b)) => {
                Ok(QuantumState::Mixed(DensityMatrix::from_raw(a.num_qubits(), &a.matrix + &b.matrix)))
            }
            _ => Err(TeleportError::InvalidOperation {
                message: "Cannot add a state vector to a density operator".to_string(),
            }),
        }
    }

    /// Overlap with an expected pure state: `|<e|ψ>|` for a vector,
    /// `Re <e|ρ|e>` for a density operator.
    pub fn overlap_with(&self, expected: &StateVector) -> Result<f64, TeleportError> {
        match self {
            QuantumState::Pure(psi) => Ok(expected.inner(psi)?.norm()),
            QuantumState::Mixed(rho) => Ok(rho.expectation(expected)?.re),
        }
    }

    /// `true` when every amplitude or matrix element is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            QuantumState::Pure(psi) => psi.amplitudes().iter().all(|c| c.is_finite()),
            QuantumState::Mixed(rho) => rho.matrix().iter().all(|c| c.is_finite()),
        }
    }

    /// Largest elementwise distance to another state of the same kind.
    pub fn max_distance(&self, other: &QuantumState) -> Option<f64> {
        let (a, b): (&[Complex<f64>], &[Complex<f64>]) = match (self, other) {
            (QuantumState::Pure(a), QuantumState::Pure(b)) if a.dim() == b.dim() => {
                (a.amplitudes(), b.amplitudes())
            }
            (QuantumState::Mixed(a), QuantumState::Mixed(b)) if a.dim() == b.dim() => {
                (a.matrix().as_slice(), b.matrix().as_slice())
            }
            _ => return None,
        };
        Some(a.iter().zip(b).map(|(x, y)| (x - y).norm()).fold(0.0, f64::max))
    }
}

impl From<StateVector> for QuantumState {
    fn from(psi: StateVector) -> Self {
        QuantumState::Pure(psi)
    }
}

impl From<DensityMatrix> for QuantumState {
    fn from(rho: DensityMatrix) -> Self {
        QuantumState::Mixed(rho)
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ket[")?;
        for (i, c) in self.amplitudes().iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantumState::Pure(psi) => write!(f, "{}", psi),
            QuantumState::Mixed(rho) => {
                write!(f, "Density[{} qubits, trace {:.4}]", rho.num_qubits(), rho.trace())
            }
        }
    }
}

/// The six cardinal Bloch-sphere states `[z0, z1, x+, x-, y+, y-]`.
pub fn bloch_states() -> [StateVector; 6] {
    let zero = StateVector::basis(0);
    let one = StateVector::basis(1);
    let combine = |phase: Complex<f64>| {
        StateVector::from_raw(1, DVector::from_vec(vec![Complex::one(), phase])).unit()
    };
    [
        zero,
        one,
        combine(Complex::new(1.0, 0.0)),
        combine(Complex::new(-1.0, 0.0)),
        combine(Complex::new(0.0, 1.0)),
        combine(Complex::new(0.0, -1.0)),
    ]
}

/// A Haar-random single-qubit state drawn from `rng`: independent standard
/// normal real and imaginary parts, normalized.
pub fn random_ket<R: Rng + ?Sized>(rng: &mut R) -> StateVector {
    let amplitudes = DVector::from_fn(2, |_, _| {
        Complex::new(rng.sample::<f64, _>(StandardNormal), rng.sample::<f64, _>(StandardNormal))
    });
    StateVector::from_raw(1, amplitudes).unit()
}

/// Named single-qubit input states accepted by the demos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputState {
    /// `|0>`
    Z0,
    /// `|1>`
    Z1,
    /// `|+>`
    XPlus,
    /// `|->`
    XMinus,
    /// `|+i>`
    YPlus,
    /// `|-i>`
    YMinus,
    /// A random state
    Random,
}

impl InputState {
    /// Resolves the label to a state vector. `rng` is only used by
    /// [`InputState::Random`].
    pub fn to_state<R: Rng + ?Sized>(self, rng: &mut R) -> StateVector {
        let [z0, z1, xp, xm, yp, ym] = bloch_states();
        match self {
            InputState::Z0 => z0,
            InputState::Z1 => z1,
            InputState::XPlus => xp,
            InputState::XMinus => xm,
            InputState::YPlus => yp,
            InputState::YMinus => ym,
            InputState::Random => random_ket(rng),
        }
    }
}

impl FromStr for InputState {
    type Err = TeleportError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "z0" => Ok(InputState::Z0),
            "z1" => Ok(InputState::Z1),
            "xp" => Ok(InputState::XPlus),
            "xm" => Ok(InputState::XMinus),
            "yp" => Ok(InputState::YPlus),
            "ym" => Ok(InputState::YMinus),
            "rnd" => Ok(InputState::Random),
            _ => Err(TeleportError::UnknownInputState { label: label.to_string() }),
        }
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InputState::Z0 => "z0",
            InputState::Z1 => "z1",
            InputState::XPlus => "xp",
            InputState::XMinus => "xm",
            InputState::YPlus => "yp",
            InputState::YMinus => "ym",
            InputState::Random => "rnd",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn tensor_orders_first_factor_most_significant() -> Result<(), TeleportError> {
        // |1> ⊗ |0> = |10>, index 2
        let psi = StateVector::tensor(&[StateVector::basis(1), StateVector::basis(0)])?;
        assert_eq!(psi.num_qubits(), 2);
        assert_eq!(psi.amplitudes()[2], Complex::one());
        Ok(())
    }

    #[test]
    fn bloch_states_are_normalized_and_distinct() -> Result<(), TeleportError> {
        let states = bloch_states();
        for s in &states {
            assert_abs_diff_eq!(s.norm(), 1.0, epsilon = 1e-12);
        }
        // x+ and x- are orthogonal
        assert_abs_diff_eq!(states[2].inner(&states[3])?.norm(), 0.0, epsilon = 1e-12);
        // y+ and y- are orthogonal
        assert_abs_diff_eq!(states[4].inner(&states[5])?.norm(), 0.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn random_ket_is_normalized_and_reproducible() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let psi = random_ket(&mut a);
        assert_abs_diff_eq!(psi.norm(), 1.0, epsilon = 1e-12);
        assert_eq!(psi, random_ket(&mut b));
    }

    #[test]
    fn random_ket_draws_standard_normal_components() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut replay = StdRng::seed_from_u64(11);
        let psi = random_ket(&mut rng);
        let raw: Vec<f64> = (0..4).map(|_| replay.sample(StandardNormal)).collect();
        let norm = raw.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert_abs_diff_eq!(psi.amplitudes()[0].re, raw[0] / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(psi.amplitudes()[0].im, raw[1] / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(psi.amplitudes()[1].re, raw[2] / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(psi.amplitudes()[1].im, raw[3] / norm, epsilon = 1e-12);
    }

    #[test]
    fn density_matrix_requires_square_power_of_two() -> Result<(), TeleportError> {
        assert!(DensityMatrix::new(DMatrix::zeros(2, 4)).is_err());
        assert!(DensityMatrix::new(DMatrix::zeros(3, 3)).is_err());
        let rho = DensityMatrix::new(DMatrix::<Complex<f64>>::identity(4, 4) * Complex::new(0.25, 0.0))?;
        assert_eq!(rho.num_qubits(), 2);
        assert_abs_diff_eq!(rho.trace().re, 1.0, epsilon = 1e-15);
        Ok(())
    }

    #[test]
    fn block_diagonal_clears_cross_block_coherence() {
        let rho = bloch_states()[2].to_density();
        let dephased = rho.block_diagonal(|index| index);
        assert_eq!(dephased.get(0, 1), Complex::zero());
        assert_abs_diff_eq!(dephased.get(1, 1).re, 0.5, epsilon = 1e-12);
        let untouched = rho.block_diagonal(|_| 0);
        assert_eq!(untouched, rho);
    }

    #[test]
    fn input_labels_parse_and_reject_unknown() {
        assert_eq!("yp".parse::<InputState>(), Ok(InputState::YPlus));
        assert_eq!(InputState::XMinus.to_string(), "xm");
        let err = "w0".parse::<InputState>().unwrap_err();
        assert_eq!(err, TeleportError::UnknownInputState { label: "w0".to_string() });
    }

    #[test]
    fn weight_is_norm_for_vectors_and_trace_for_densities() -> Result<(), TeleportError> {
        let half = StateVector::new(vec![Complex::new(0.6, 0.0), Complex::new(0.0, 0.0)])?;
        let pure = QuantumState::Pure(half.clone());
        let mixed = QuantumState::Mixed(half.to_density());
        assert_abs_diff_eq!(pure.weight(), 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(mixed.weight(), 0.36, epsilon = 1e-15);
        Ok(())
    }

    #[test]
    fn correction_formula_depends_on_variant() -> Result<(), TeleportError> {
        // U = |1><0| is not unitary but makes Uψ and U†ρU distinguishable.
        let u = Operator::from_triplets(1, [(1, 0, Complex::one())])?;
        let psi = StateVector::basis(0);

        let pure = QuantumState::Pure(psi.clone()).correct(&u)?;
        assert_eq!(pure, QuantumState::Pure(StateVector::basis(1)));

        // U†|0><0|U = 0 since U maps into |1> only from the right side
        let mixed = QuantumState::Mixed(psi.to_density()).correct(&u)?;
        assert_abs_diff_eq!(mixed.weight(), 0.0, epsilon = 1e-15);
        let mixed_from_one = QuantumState::Mixed(StateVector::basis(1).to_density()).correct(&u)?;
        assert_eq!(mixed_from_one, QuantumState::Mixed(psi.to_density()));
        Ok(())
    }

    #[test]
    fn mixed_overlap_is_expectation_value() -> Result<(), TeleportError> {
        let [z0, _, xp, ..] = bloch_states();
        let rho = QuantumState::Mixed(xp.to_density());
        assert_abs_diff_eq!(rho.overlap_with(&z0)?, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rho.overlap_with(&xp)?, 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn adding_pure_and_mixed_is_rejected() {
        let psi = StateVector::basis(0);
        let sum = QuantumState::Pure(psi.clone()).checked_add(&QuantumState::Mixed(psi.to_density()));
        assert!(matches!(sum, Err(TeleportError::InvalidOperation { .. })));
    }
}
