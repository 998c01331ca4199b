// src/validation/mod.rs

//! Consistency checks for states, Hamiltonians and measurements.
//!
//! Nothing in the simulation calls these on its own; branch states are
//! deliberately left un-normalized. They exist for tests and for callers that
//! want to assert physical sanity at a given point.

use crate::core::{Operator, QuantumState, StateVector, TeleportError};
use crate::simulation::MeasurementOutcome;

// Default tolerance values (can be overridden by caller)
const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;
const DEFAULT_HERMITIAN_TOLERANCE: f64 = 1e-12;
const DEFAULT_COMPLETENESS_TOLERANCE: f64 = 1e-12;
const DEFAULT_OVERLAP_TOLERANCE: f64 = 1e-8;

/// Checks that a state has unit weight: `Σ|c_i|² ≈ 1` for a vector,
/// `tr ρ ≈ 1` (real) for a density operator.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(TeleportError::ValidationFailure)` otherwise.
pub fn check_normalization(state: &QuantumState, tolerance: Option<f64>) -> Result<(), TeleportError> {
    let tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let (total, imaginary) = match state {
        QuantumState::Pure(psi) => (psi.amplitudes().iter().map(|c| c.norm_sqr()).sum::<f64>(), 0.0),
        QuantumState::Mixed(rho) => {
            let tr = rho.trace();
            (tr.re, tr.im)
        }
    };
    if (total - 1.0).abs() > tolerance || imaginary.abs() > tolerance {
        return Err(TeleportError::ValidationFailure {
            message: format!("State normalization failed: total weight {total} + {imaginary}i (tolerance {tolerance})"),
        });
    }
    Ok(())
}

/// Checks `H == H†` entrywise.
pub fn check_hermitian(op: &Operator, tolerance: Option<f64>) -> Result<(), TeleportError> {
    let tolerance = tolerance.unwrap_or(DEFAULT_HERMITIAN_TOLERANCE);
    if op.is_hermitian(tolerance) {
        Ok(())
    } else {
        Err(TeleportError::ValidationFailure {
            message: format!("Operator on {} qubits is not Hermitian (tolerance {tolerance})", op.num_qubits()),
        })
    }
}

/// Checks that un-normalized measurement branches are consistent with
/// `state` and that their projectors resolve the identity.
///
/// A state vector must be reconstructed exactly: `Σ Pψ = ψ`. A density
/// operator loses its coherences between different outcomes, so `Σ PρP` must
/// equal `ρ` with those blocks cleared, and the branch traces must add up to
/// `tr ρ`.
pub fn check_projector_completeness(
    state: &QuantumState,
    outcomes: &[MeasurementOutcome],
    tolerance: Option<f64>,
) -> Result<(), TeleportError> {
    let tolerance = tolerance.unwrap_or(DEFAULT_COMPLETENESS_TOLERANCE);
    let Some((first, rest)) = outcomes.split_first() else {
        return Err(TeleportError::ValidationFailure {
            message: "No measurement outcomes to check".to_string(),
        });
    };

    let mut projectors = first.projector.clone();
    let mut total = first.state.clone();
    for outcome in rest {
        projectors = projectors.checked_add(&outcome.projector)?;
        total = total.checked_add(&outcome.state)?;
    }

    if !projectors.approx_eq(&Operator::identity(state.num_qubits()), tolerance) {
        return Err(TeleportError::ValidationFailure {
            message: "Measurement projectors do not sum to the identity".to_string(),
        });
    }

    let reference = match state {
        QuantumState::Pure(_) => state.clone(),
        QuantumState::Mixed(rho) => {
            let branch_trace: f64 = outcomes.iter().map(|o| o.state.weight()).sum();
            let input_trace = rho.trace().re;
            if (branch_trace - input_trace).abs() > tolerance {
                return Err(TeleportError::ValidationFailure {
                    message: format!("Branch traces sum to {branch_trace}, input trace is {input_trace}"),
                });
            }
            let block_of = |index: usize| {
                outcomes
                    .iter()
                    .position(|o| o.projector.get(index, index).re > 0.5)
                    .unwrap_or(outcomes.len())
            };
            QuantumState::Mixed(rho.block_diagonal(block_of))
        }
    };
    match total.max_distance(&reference) {
        Some(d) if d <= tolerance => Ok(()),
        Some(d) => Err(TeleportError::ValidationFailure {
            message: format!("Branch states differ from the input by up to {d:.3e} (tolerance {tolerance})"),
        }),
        None => Err(TeleportError::ValidationFailure {
            message: "Branch states and input have different kinds or sizes".to_string(),
        }),
    }
}

/// Checks that `actual` overlaps `expected` with magnitude ≈ 1.
pub fn check_overlap(actual: &QuantumState, expected: &StateVector, tolerance: Option<f64>) -> Result<(), TeleportError> {
    let tolerance = tolerance.unwrap_or(DEFAULT_OVERLAP_TOLERANCE);
    let overlap = actual.overlap_with(expected)?;
    if (overlap - 1.0).abs() > tolerance {
        return Err(TeleportError::ValidationFailure {
            message: format!("Overlap {overlap:.12} deviates from 1 by more than {tolerance}"),
        });
    }
    Ok(())
}

/// Performs basic validation checks on a state: every entry finite and unit
/// weight within `norm_tolerance`.
pub fn validate_state(state: &QuantumState, norm_tolerance: Option<f64>) -> Result<(), TeleportError> {
    if !state.is_finite() {
        return Err(TeleportError::ValidationFailure {
            message: "State contains non-finite entries".to_string(),
        });
    }
    check_normalization(state, norm_tolerance)
}
