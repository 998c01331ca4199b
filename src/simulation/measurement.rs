// src/simulation/measurement.rs

//! Projective measurement of a subset of qubits.

use tracing::trace;

use crate::core::{Operator, QuantumState, TeleportError};
use crate::operations::{basis_projector, embed};

/// One branch of a projective measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementOutcome {
    /// Outcome bits of the measured qubits, in qubit order.
    pub bits: Vec<u8>,
    /// Full-register projector `⊗ |b><b|` (identity on unmeasured qubits).
    pub projector: Operator,
    /// Projected state, normalized by `weight` when requested.
    pub state: QuantumState,
    /// Weight of the projected state before any normalization: the norm of a
    /// vector or the trace of a density operator.
    pub weight: f64,
}

impl MeasurementOutcome {
    /// Value of the outcome bit for a measured qubit, by its position among the
    /// measured qubits.
    pub fn bit(&self, position: usize) -> Option<u8> {
        self.bits.get(position).copied()
    }
}

/// Projects `state` onto every joint computational-basis outcome of the
/// qubits flagged in `register`.
///
/// Outcomes are enumerated lexicographically with the first measured qubit
/// most significant, so `2^k` outcomes are returned for `k` flagged qubits,
/// including those with zero weight. With `normalize` set each branch of
/// positive weight is divided by it; other branches are returned as they are.
/// Without normalization the branch states of a vector sum back to the input;
/// for a density operator they sum to the input with the coherences between
/// different outcomes removed.
pub fn projective_measurement(
    state: &QuantumState,
    register: &[bool],
    normalize: bool,
) -> Result<Vec<MeasurementOutcome>, TeleportError> {
    let num_qubits = state.num_qubits();
    if register.len() != num_qubits {
        return Err(TeleportError::dimension_mismatch(num_qubits, register.len(), "measurement register"));
    }
    let measured: Vec<usize> = register
        .iter()
        .enumerate()
        .filter_map(|(qubit, &flagged)| flagged.then_some(qubit))
        .collect();
    let k = measured.len();

    (0..1usize << k)
        .map(|config| {
            let bits: Vec<u8> = (0..k).map(|j| ((config >> (k - 1 - j)) & 1) as u8).collect();
            let sites: Vec<(usize, Operator)> = measured
                .iter()
                .zip(&bits)
                .map(|(&qubit, &bit)| (qubit, basis_projector(bit)))
                .collect();
            let projector = embed(num_qubits, &sites)?;
            let projected = state.project(&projector)?;
            let weight = projected.weight();
            trace!(?bits, weight, "measurement branch");
            let state = if normalize && weight > 0.0 {
                projected.divided_by(weight)
            } else {
                projected
            };
            Ok(MeasurementOutcome { bits, projector, state, weight })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DensityMatrix, StateVector, bloch_states};
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;
    use num_complex::Complex;

    fn ghz_like() -> Result<QuantumState, TeleportError> {
        // (|000> + |011>)/√2 on three qubits
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let mut amps = vec![Complex::new(0.0, 0.0); 8];
        amps[0] = Complex::new(h, 0.0);
        amps[3] = Complex::new(h, 0.0);
        Ok(QuantumState::Pure(StateVector::new(amps)?))
    }

    #[test]
    fn outcomes_are_lexicographic_and_include_zero_weight() -> Result<(), TeleportError> {
        let outcomes = projective_measurement(&ghz_like()?, &[true, false, true], false)?;
        let bits: Vec<Vec<u8>> = outcomes.iter().map(|o| o.bits.clone()).collect();
        assert_eq!(bits, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
        assert_abs_diff_eq!(outcomes[0].weight, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_abs_diff_eq!(outcomes[1].weight, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_eq!(outcomes[2].weight, 0.0);
        assert_eq!(outcomes[3].bit(1), Some(1));
        Ok(())
    }

    fn branch_sum(outcomes: &[MeasurementOutcome]) -> Result<QuantumState, TeleportError> {
        let mut total = outcomes[0].state.clone();
        for o in &outcomes[1..] {
            total = total.checked_add(&o.state)?;
        }
        Ok(total)
    }

    #[test]
    fn unnormalized_vector_branches_sum_to_input() -> Result<(), TeleportError> {
        let psi = ghz_like()?;
        let outcomes = projective_measurement(&psi, &[false, true, true], false)?;
        assert!(branch_sum(&outcomes)?.max_distance(&psi).unwrap_or(f64::INFINITY) < 1e-12);
        Ok(())
    }

    #[test]
    fn unnormalized_density_branches_drop_cross_outcome_coherence() -> Result<(), TeleportError> {
        let rho = ghz_like()?.into_density();
        let outcomes = projective_measurement(&QuantumState::Mixed(rho.clone()), &[false, true, true], false)?;
        // Qubits 1 and 2 are the two low bits of the basis index.
        let expected = QuantumState::Mixed(rho.block_diagonal(|index| index & 0b11));
        assert!(branch_sum(&outcomes)?.max_distance(&expected).unwrap_or(f64::INFINITY) < 1e-12);
        // ρ[0][3] linked |000> and |011>, which land in different outcomes
        assert_abs_diff_eq!(rho.get(0, 3).re, 0.5, epsilon = 1e-12);
        let QuantumState::Mixed(sum) = branch_sum(&outcomes)? else {
            panic!("density branches must stay density operators");
        };
        assert_eq!(sum.get(0, 3), Complex::new(0.0, 0.0));
        Ok(())
    }

    #[test]
    fn non_positive_weight_is_not_normalized() -> Result<(), TeleportError> {
        // A density operator whose |1><1| block carries a tiny negative trace
        let elements = DMatrix::from_row_slice(2, 2, &[
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 0.0),
            Complex::new(0.0, 0.0),
            Complex::new(-1e-17, 0.0),
        ]);
        let rho = QuantumState::Mixed(DensityMatrix::new(elements)?);
        let outcomes = projective_measurement(&rho, &[true], true)?;
        assert!(outcomes[1].weight < 0.0);
        let QuantumState::Mixed(negative) = &outcomes[1].state else {
            panic!("density branches must stay density operators");
        };
        assert_eq!(negative.get(1, 1), Complex::new(-1e-17, 0.0));
        Ok(())
    }

    #[test]
    fn normalized_mixed_branches_have_unit_trace() -> Result<(), TeleportError> {
        let rho = QuantumState::Mixed(bloch_states()[2].to_density());
        let outcomes = projective_measurement(&rho, &[true], true)?;
        assert_eq!(outcomes.len(), 2);
        for o in &outcomes {
            assert_abs_diff_eq!(o.weight, 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(o.state.weight(), 1.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn empty_mask_yields_single_identity_branch() -> Result<(), TeleportError> {
        let psi = QuantumState::Pure(bloch_states()[4].clone());
        let outcomes = projective_measurement(&psi, &[false], true)?;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].bits.is_empty());
        assert!(outcomes[0].projector.approx_eq(&Operator::identity(1), 0.0));
        Ok(())
    }

    #[test]
    fn register_length_must_match() {
        let psi = QuantumState::Pure(bloch_states()[0].clone());
        assert!(matches!(
            projective_measurement(&psi, &[true, true], false),
            Err(TeleportError::DimensionMismatch { .. })
        ));
    }
}
