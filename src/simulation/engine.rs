// src/simulation/engine.rs

//! Time evolution of register states.
//!
//! Closed systems evolve the state vector under the Schrödinger equation.
//! As soon as jump operators are supplied the state is promoted to a density
//! operator and the Lindblad master equation
//!
//! ```text
//! dρ/dt = -i[H, ρ] + Σ_k ( L_k ρ L_k† - ½{L_k† L_k, ρ} )
//! ```
//!
//! is integrated instead. Both use classical fourth-order Runge-Kutta with
//! `resolution - 1` equal steps between 0 and `t`.

use std::ops::{Add, Mul};

use nalgebra::DMatrix;
use num_complex::Complex;
use tracing::trace;

use crate::core::{DensityMatrix, Operator, QuantumState, StateVector, TeleportError};

/// Number of time points used when no other resolution is configured.
pub const DEFAULT_RESOLUTION: usize = 200;

/// Numerical settings for [`evolve_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionOptions {
    /// Number of time points between 0 and `t`, both included.
    pub resolution: usize,
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self { resolution: DEFAULT_RESOLUTION }
    }
}

impl EvolutionOptions {
    /// Options with the default resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of time points.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    fn steps(&self) -> Result<usize, TeleportError> {
        if self.resolution < 2 {
            return Err(TeleportError::InvalidConfiguration {
                message: format!("Evolution needs at least 2 time points, got {}", self.resolution),
            });
        }
        Ok(self.resolution - 1)
    }
}

/// `exp(-i (t/2) H)`.
///
/// The evolution parameter is halved before exponentiating, so `t = π` is the
/// half-period at which the gate Hamiltonians realize their gates.
pub fn derive_unitary(hamiltonian: &Operator, t: f64) -> Operator {
    hamiltonian.scaled(Complex::new(0.0, -t / 2.0)).expm()
}

/// Evolves `state` under `hamiltonian` from 0 to `t` and returns the final
/// state.
///
/// A pure state without dissipators stays pure. With any dissipator (even a
/// zero-rate one) the result is a density operator. `t` may be negative.
pub fn evolve_state(
    hamiltonian: &Operator,
    t: f64,
    state: &QuantumState,
    dissipators: &[Operator],
    options: &EvolutionOptions,
) -> Result<QuantumState, TeleportError> {
    let steps = options.steps()?;
    let dim = state.dim();
    if hamiltonian.dim() != dim {
        return Err(TeleportError::dimension_mismatch(dim, hamiltonian.dim(), "Hamiltonian"));
    }
    if let Some(l) = dissipators.iter().find(|l| l.dim() != dim) {
        return Err(TeleportError::dimension_mismatch(dim, l.dim(), "dissipator"));
    }

    let evolved = match state {
        QuantumState::Pure(psi) if dissipators.is_empty() => {
            trace!(t, steps, dim, "integrating Schrödinger equation");
            let minus_i = Complex::new(0.0, -1.0);
            let amplitudes = rk4(psi.vector().clone(), t, steps, |y| hamiltonian.apply_to(y) * minus_i);
            QuantumState::Pure(StateVector::from_raw(psi.num_qubits(), amplitudes))
        }
        _ => {
            trace!(t, steps, dim, jumps = dissipators.len(), "integrating Lindblad equation");
            let generator = LindbladGenerator::new(hamiltonian, dissipators)?;
            let rho = state.clone().into_density();
            let matrix = rk4(rho.matrix().clone(), t, steps, |y| generator.apply(y));
            QuantumState::Mixed(DensityMatrix::from_raw(rho.num_qubits(), matrix))
        }
    };

    if !evolved.is_finite() {
        return Err(TeleportError::IntegrationFailure {
            message: format!("Non-finite state after evolving for t = {t} over {steps} steps"),
        });
    }
    Ok(evolved)
}

/// Classical RK4 for `dy/dt = f(y)` with a time-independent right-hand side.
fn rk4<Y, F>(mut y: Y, t: f64, steps: usize, f: F) -> Y
where
    Y: Clone + Add<Output = Y> + Mul<Complex<f64>, Output = Y>,
    F: Fn(&Y) -> Y,
{
    if t == 0.0 {
        return y;
    }
    let h = Complex::new(t / steps as f64, 0.0);
    let half = h * 0.5;
    for _ in 0..steps {
        let k1 = f(&y);
        let k2 = f(&(y.clone() + k1.clone() * half));
        let k3 = f(&(y.clone() + k2.clone() * half));
        let k4 = f(&(y.clone() + k3.clone() * h));
        y = y + (k1 + (k2 + k3) * Complex::new(2.0, 0.0) + k4) * (h / 6.0);
    }
    y
}

/// `M·B` given `Bᵀ`, so the sparse factor stays on the left.
fn right_mul_transposed(transposed: &Operator, m: &DMatrix<Complex<f64>>) -> DMatrix<Complex<f64>> {
    transposed.left_mul(&m.transpose()).transpose()
}

/// Jump-operator contribution `Σ L ρ L†`.
enum JumpTerms {
    None,
    /// All jump operators diagonal: `Σ L ρ L†` is the element-wise product
    /// with `kernel[a][b] = Σ_k l_k(a) conj(l_k(b))`.
    Diagonal { kernel: DMatrix<Complex<f64>> },
    /// General jump operators stored as `(L, (L†)ᵀ)` pairs.
    General { pairs: Vec<(Operator, Operator)> },
}

/// Right-hand side of the Lindblad equation, written with the non-Hermitian
/// effective Hamiltonian `H_eff = H - (i/2) Σ L†L`:
/// `dρ/dt = -i(H_eff ρ - ρ H_eff†) + Σ L ρ L†`.
struct LindbladGenerator {
    effective: Operator,
    /// `(H_eff†)ᵀ`, the conjugate of `H_eff`.
    effective_conj: Operator,
    jumps: JumpTerms,
}

impl LindbladGenerator {
    fn new(hamiltonian: &Operator, dissipators: &[Operator]) -> Result<Self, TeleportError> {
        let dim = hamiltonian.dim();
        let mut decay = Operator::zero(hamiltonian.num_qubits());
        for l in dissipators {
            decay = decay.checked_add(&l.dagger().checked_mul(l)?)?;
        }
        let effective = hamiltonian.checked_add(&decay.scaled(Complex::new(0.0, -0.5)))?;
        let effective_conj = effective.dagger().transpose();

        let jumps = if dissipators.is_empty() {
            JumpTerms::None
        } else if dissipators.iter().all(Operator::is_diagonal) {
            let kernel = dissipators.iter().fold(DMatrix::<Complex<f64>>::zeros(dim, dim), |acc, l| {
                let diagonal = l.diagonal();
                acc + &diagonal * diagonal.adjoint()
            });
            JumpTerms::Diagonal { kernel }
        } else {
            JumpTerms::General {
                pairs: dissipators.iter().map(|l| (l.clone(), l.dagger().transpose())).collect(),
            }
        };

        Ok(Self { effective, effective_conj, jumps })
    }

    fn apply(&self, rho: &DMatrix<Complex<f64>>) -> DMatrix<Complex<f64>> {
        let mut out = self.effective.left_mul(rho) * Complex::new(0.0, -1.0)
            + right_mul_transposed(&self.effective_conj, rho) * Complex::new(0.0, 1.0);
        match &self.jumps {
            JumpTerms::None => {}
            JumpTerms::Diagonal { kernel } => out += kernel.component_mul(rho),
            JumpTerms::General { pairs } => {
                for (l, l_dagger_t) in pairs {
                    out += right_mul_transposed(l_dagger_t, &l.left_mul(rho));
                }
            }
        }
        out
    }
}
