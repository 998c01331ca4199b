// src/core/operator.rs

//! Sparse linear operators acting on an N-qubit tensor-product space.
//!
//! Every operator the protocol needs (Pauli strings, Hamiltonians built from
//! them, projectors, gates) has at most a handful of non-zeros per row, so the
//! storage is a `nalgebra_sparse` CSR matrix. Sums and products stay
//! `Operator`s; they never collapse to plain numbers.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use nalgebra::{DMatrix, DVector, Matrix2};
use nalgebra_sparse::{coo::CooMatrix, csr::CsrMatrix};
use num_complex::Complex;
use num_traits::Zero;

use crate::core::TeleportError;

/// Entries with magnitude at or below this are dropped when assembling.
const PRUNE_TOLERANCE: f64 = 1e-15;

/// A linear operator on `num_qubits` qubits stored in CSR form.
///
/// Basis ordering follows the usual tensor-product convention: qubit 0 is the
/// most significant bit of a basis index.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    num_qubits: usize,
    matrix: CsrMatrix<Complex<f64>>,
}

impl Operator {
    fn from_csr(num_qubits: usize, matrix: CsrMatrix<Complex<f64>>) -> Self {
        let matrix = matrix.filter(|_, _, v| v.norm() > PRUNE_TOLERANCE);
        Self { num_qubits, matrix }
    }

    /// Builds a single-qubit operator from its 2x2 matrix.
    pub fn single(matrix: Matrix2<Complex<f64>>) -> Self {
        Self::from_csr(1, CsrMatrix::from(&matrix))
    }

    /// Identity on `num_qubits` qubits.
    pub fn identity(num_qubits: usize) -> Self {
        Self { num_qubits, matrix: CsrMatrix::identity(1 << num_qubits) }
    }

    /// The zero operator on `num_qubits` qubits.
    pub fn zero(num_qubits: usize) -> Self {
        let dim = 1 << num_qubits;
        Self { num_qubits, matrix: CsrMatrix::zeros(dim, dim) }
    }

    /// Diagonal operator. Panics if `diagonal.len()` is not `2^num_qubits`.
    pub fn from_diagonal(num_qubits: usize, diagonal: Vec<Complex<f64>>) -> Self {
        assert_eq!(diagonal.len(), 1 << num_qubits, "diagonal length must be 2^num_qubits");
        let dim = diagonal.len();
        let mut coo = CooMatrix::new(dim, dim);
        for (i, v) in diagonal.into_iter().enumerate() {
            coo.push(i, i, v);
        }
        Self::from_csr(num_qubits, CsrMatrix::from(&coo))
    }

    /// Builds an operator from `(row, column, value)` entries. Repeated
    /// positions are summed.
    pub fn from_triplets<I>(num_qubits: usize, entries: I) -> Result<Self, TeleportError>
    where
        I: IntoIterator<Item = (usize, usize, Complex<f64>)>,
    {
        let dim = 1usize << num_qubits;
        let mut coo = CooMatrix::new(dim, dim);
        for (r, c, v) in entries {
            if r >= dim || c >= dim {
                return Err(TeleportError::InvalidOperation {
                    message: format!("Entry ({r}, {c}) lies outside a {dim}x{dim} operator"),
                });
            }
            coo.push(r, c, v);
        }
        Ok(Self::from_csr(num_qubits, CsrMatrix::from(&coo)))
    }

    /// Builds an operator from a dense square matrix.
    pub fn from_dense(num_qubits: usize, dense: &DMatrix<Complex<f64>>) -> Result<Self, TeleportError> {
        let dim = 1usize << num_qubits;
        if dense.shape() != (dim, dim) {
            return Err(TeleportError::dimension_mismatch(dim * dim, dense.len(), "dense operator"));
        }
        Ok(Self::from_csr(num_qubits, CsrMatrix::from(dense)))
    }

    /// Number of qubits the operator acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert-space dimension, `2^num_qubits`.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// The underlying CSR matrix.
    pub fn matrix(&self) -> &CsrMatrix<Complex<f64>> {
        &self.matrix
    }

    /// All stored entries as `(row, column, value)`.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, Complex<f64>)> + '_ {
        self.matrix.triplet_iter().map(|(r, c, v)| (r, c, *v))
    }

    /// Matrix element `<r|A|c>`.
    pub fn get(&self, r: usize, c: usize) -> Complex<f64> {
        self.matrix.get_entry(r, c).map_or_else(Complex::zero, |entry| entry.into_value())
    }

    /// Kronecker product `self ⊗ other`.
    pub fn kron(&self, other: &Operator) -> Operator {
        let (x, y) = (&self.matrix, &other.matrix);
        let mut result = CooMatrix::new(x.nrows() * y.nrows(), x.ncols() * y.ncols());
        for (rx, cx, vx) in x.triplet_iter() {
            for (ry, cy, vy) in y.triplet_iter() {
                result.push(rx * y.nrows() + ry, cx * y.ncols() + cy, vx * vy);
            }
        }
        Operator { num_qubits: self.num_qubits + other.num_qubits, matrix: CsrMatrix::from(&result) }
    }

    /// Transpose `Aᵀ` (no conjugation).
    pub fn transpose(&self) -> Operator {
        Operator { num_qubits: self.num_qubits, matrix: self.matrix.transpose() }
    }

    /// Hermitian conjugate `A†`.
    pub fn dagger(&self) -> Operator {
        let mut matrix = self.matrix.transpose();
        matrix.values_mut().iter_mut().for_each(|v| *v = v.conj());
        Operator { num_qubits: self.num_qubits, matrix }
    }

    /// Multiplies every entry by `factor`.
    pub fn scaled(&self, factor: Complex<f64>) -> Operator {
        let mut out = self.clone();
        out.matrix.values_mut().iter_mut().for_each(|v| *v *= factor);
        out
    }

    fn check_same_register(&self, other: &Operator, context: &str) -> Result<(), TeleportError> {
        if self.num_qubits != other.num_qubits {
            return Err(TeleportError::dimension_mismatch(self.dim(), other.dim(), context));
        }
        Ok(())
    }

    /// Sum of two operators, failing when the dimensions differ.
    pub fn checked_add(&self, other: &Operator) -> Result<Operator, TeleportError> {
        self.check_same_register(other, "operator sum")?;
        Ok(Self::from_csr(self.num_qubits, &self.matrix + &other.matrix))
    }

    /// Difference of two operators, failing when the dimensions differ.
    pub fn checked_sub(&self, other: &Operator) -> Result<Operator, TeleportError> {
        self.check_same_register(other, "operator difference")?;
        Ok(Self::from_csr(self.num_qubits, &self.matrix - &other.matrix))
    }

    /// Operator product `self · other`, failing when the dimensions differ.
    pub fn checked_mul(&self, other: &Operator) -> Result<Operator, TeleportError> {
        self.check_same_register(other, "operator product")?;
        Ok(Self::from_csr(self.num_qubits, &self.matrix * &other.matrix))
    }

    /// `true` when `A == A†` entrywise within `tolerance`.
    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.entries().all(|(r, c, v)| (v - self.get(c, r).conj()).norm() <= tolerance)
    }

    /// `true` when no entry lies off the diagonal.
    pub fn is_diagonal(&self) -> bool {
        self.matrix.triplet_iter().all(|(r, c, _)| r == c)
    }

    /// The diagonal as a dense vector.
    pub fn diagonal(&self) -> DVector<Complex<f64>> {
        DVector::from_fn(self.dim(), |i, _| self.get(i, i))
    }

    /// Largest entry magnitude (0 for the zero operator).
    pub fn max_abs(&self) -> f64 {
        self.matrix.values().iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    /// Entrywise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Operator, tolerance: f64) -> bool {
        match self.checked_sub(other) {
            Ok(diff) => diff.max_abs() <= tolerance,
            Err(_) => false,
        }
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> DMatrix<Complex<f64>> {
        DMatrix::from(&self.matrix)
    }

    /// Matrix-vector product `A·x`.
    pub fn apply_to(&self, x: &DVector<Complex<f64>>) -> DVector<Complex<f64>> {
        &self.matrix * x
    }

    /// `A·M` for a dense `M`.
    pub fn left_mul(&self, m: &DMatrix<Complex<f64>>) -> DMatrix<Complex<f64>> {
        &self.matrix * m
    }

    /// `M·A` for a dense `M`, computed as `(Aᵀ·Mᵀ)ᵀ` to stay sparse-times-dense.
    pub fn right_mul(&self, m: &DMatrix<Complex<f64>>) -> DMatrix<Complex<f64>> {
        (&self.matrix.transpose() * &m.transpose()).transpose()
    }

    /// Matrix exponential `exp(A)`.
    ///
    /// Works on a dense copy, so it is meant for building unitaries of small
    /// registers and for checks, not for the inner loop of evolution.
    pub fn expm(&self) -> Operator {
        Self::from_csr(self.num_qubits, CsrMatrix::from(&self.to_dense().exp()))
    }
}

/// Tensor product of a list of operators, first entry most significant.
pub fn tensor(factors: &[Operator]) -> Result<Operator, TeleportError> {
    let (first, rest) = factors.split_first().ok_or_else(|| TeleportError::InvalidOperation {
        message: "Cannot form the tensor product of an empty operator list".to_string(),
    })?;
    Ok(rest.iter().fold(first.clone(), |acc, op| acc.kron(op)))
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Operator[{} qubits, {} non-zeros]", self.num_qubits, self.nnz())?;
        for (r, c, v) in self.entries() {
            writeln!(f, "  ({}, {}) = {:.4}", r, c, v)?;
        }
        Ok(())
    }
}

// Arithmetic through std::ops panics on mismatched registers, like dense
// matrix libraries do. Use `checked_add` / `checked_mul` for the fallible form.

impl Add<&Operator> for &Operator {
    type Output = Operator;

    fn add(self, rhs: &Operator) -> Operator {
        match self.checked_add(rhs) {
            Ok(sum) => sum,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Add for Operator {
    type Output = Operator;

    fn add(self, rhs: Operator) -> Operator {
        &self + &rhs
    }
}

impl AddAssign<&Operator> for Operator {
    fn add_assign(&mut self, rhs: &Operator) {
        *self = &*self + rhs;
    }
}

impl Sub<&Operator> for &Operator {
    type Output = Operator;

    fn sub(self, rhs: &Operator) -> Operator {
        match self.checked_sub(rhs) {
            Ok(diff) => diff,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Sub for Operator {
    type Output = Operator;

    fn sub(self, rhs: Operator) -> Operator {
        &self - &rhs
    }
}

impl Neg for Operator {
    type Output = Operator;

    fn neg(self) -> Operator {
        self.scaled(-Complex::new(1.0, 0.0))
    }
}

impl Mul<&Operator> for &Operator {
    type Output = Operator;

    fn mul(self, rhs: &Operator) -> Operator {
        match self.checked_mul(rhs) {
            Ok(product) => product,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Mul for Operator {
    type Output = Operator;

    fn mul(self, rhs: Operator) -> Operator {
        &self * &rhs
    }
}

impl Mul<Complex<f64>> for Operator {
    type Output = Operator;

    fn mul(self, rhs: Complex<f64>) -> Operator {
        self.scaled(rhs)
    }
}

impl Mul<f64> for Operator {
    type Output = Operator;

    fn mul(self, rhs: f64) -> Operator {
        self.scaled(Complex::new(rhs, 0.0))
    }
}

impl Mul<Operator> for f64 {
    type Output = Operator;

    fn mul(self, rhs: Operator) -> Operator {
        rhs.scaled(Complex::new(self, 0.0))
    }
}

impl Div<f64> for Operator {
    type Output = Operator;

    fn div(self, rhs: f64) -> Operator {
        self.scaled(Complex::new(1.0 / rhs, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn pauli_x() -> Operator {
        Operator::single(Matrix2::new(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0)))
    }

    fn pauli_z() -> Operator {
        Operator::single(Matrix2::new(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)))
    }

    #[test]
    fn kron_places_first_factor_on_most_significant_bit() {
        // X ⊗ I maps |00> (index 0) to |10> (index 2)
        let op = pauli_x().kron(&Operator::identity(1));
        let out = op.apply_to(&DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0)]));
        assert_eq!(out[2], c(1.0, 0.0));
        assert_eq!(op.nnz(), 4);
    }

    #[test]
    fn single_drops_explicit_zeros() {
        assert_eq!(pauli_x().nnz(), 2);
        assert_eq!(pauli_z().get(0, 1), c(0.0, 0.0));
    }

    #[test]
    fn sum_drops_cancelled_entries() {
        let z = pauli_z();
        let diff = &z - &z;
        assert_eq!(diff.nnz(), 0);
        assert!(diff.approx_eq(&Operator::zero(1), 0.0));
    }

    #[test]
    fn checked_add_rejects_mismatched_registers() {
        let err = pauli_x().checked_add(&Operator::identity(2)).unwrap_err();
        assert!(matches!(err, TeleportError::DimensionMismatch { .. }));
    }

    #[test]
    fn product_of_paulis_anticommutes() {
        let x = pauli_x();
        let z = pauli_z();
        let xz = &x * &z;
        let zx = &z * &x;
        assert!((xz + zx).approx_eq(&Operator::zero(1), 1e-15));
    }

    #[test]
    fn dagger_conjugates_and_transposes() {
        let op = Operator::single(Matrix2::new(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 0.0), c(0.0, 0.0)));
        let dag = op.dagger();
        assert_eq!(dag.get(1, 0), c(0.0, 1.0));
        assert_eq!(dag.get(0, 1), c(0.0, 0.0));
        assert_eq!(op.transpose().get(1, 0), c(0.0, -1.0));
        assert!(!op.is_hermitian(1e-12));
        assert!((&op + &dag).is_hermitian(1e-12));
    }

    #[test]
    fn expm_of_pauli_rotation_matches_closed_form() {
        // exp(-i θ X / 2) = cos(θ/2) I - i sin(θ/2) X
        let theta = 0.7 * PI;
        let generator = pauli_x().scaled(c(0.0, -theta / 2.0));
        let u = generator.expm();
        let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        let expected = Operator::single(Matrix2::new(c(cos, 0.0), c(0.0, -sin), c(0.0, -sin), c(cos, 0.0)));
        assert!(u.approx_eq(&expected, 1e-12));
    }

    #[test]
    fn expm_handles_large_norm() {
        let generator = Operator::identity(2).scaled(c(0.0, 10.0 * PI));
        let u = generator.expm();
        assert!(u.approx_eq(&Operator::identity(2), 1e-9));
    }

    #[test]
    fn dense_products_match_sparse_products() {
        let a = pauli_x().kron(&pauli_z());
        let m = (&pauli_z().kron(&Operator::identity(1)) + &pauli_x().kron(&pauli_x())).to_dense();
        let m_op = Operator::from_dense(2, &m).unwrap();
        assert_eq!(a.left_mul(&m), (&a * &m_op).to_dense());
        assert_eq!(a.right_mul(&m), (&m_op * &a).to_dense());
    }

    #[test]
    fn from_dense_checks_shape() {
        assert!(Operator::from_dense(2, &DMatrix::zeros(2, 2)).is_err());
    }

    #[test]
    fn tensor_of_empty_list_is_an_error() {
        assert!(tensor(&[]).is_err());
    }
}
