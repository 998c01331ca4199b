//! Error handling logic

use thiserror::Error;

/// Error types raised by the simulation.
///
/// Configuration problems (bad labels, mismatched qubit lists, wrong
/// dimensions) fail fast. Integration failures are fatal for the run that
/// produced them. Numerical degeneracy in fidelity ratios is *not* an error:
/// it surfaces as a non-finite value in the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeleportError {
    /// Operands live on Hilbert spaces of different size.
    #[error("Dimension Mismatch: {message}")]
    DimensionMismatch {
        /// DimensionMismatch failure message
        message: String,
    },

    /// A caller supplied parameters that cannot describe a valid setup,
    /// e.g. control/target lists of unequal length.
    #[error("Invalid Configuration: {message}")]
    InvalidConfiguration {
        /// InvalidConfiguration failure message
        message: String,
    },

    /// The requested input state label is not one of the known Bloch states.
    #[error("Unknown input state '{label}': expected one of z0, z1, xp, xm, yp, ym, rnd")]
    UnknownInputState {
        /// The rejected label
        label: String,
    },

    /// A qubit index does not exist in the register.
    #[error("Qubit {qubit} is out of range for a {num_qubits}-qubit register")]
    QubitOutOfRange {
        /// Offending qubit index
        qubit: usize,
        /// Register size
        num_qubits: usize,
    },

    /// An operation is inconsistent with its operands.
    #[error("Invalid Operation: {message}")]
    InvalidOperation {
        /// InvalidOperation failure message
        message: String,
    },

    /// A state or operator failed a consistency check.
    #[error("Validation Failure: {message}")]
    ValidationFailure {
        /// ValidationFailure failure message
        message: String,
    },

    /// The master-equation integrator produced an unusable state.
    #[error("Integration Failure: {message}")]
    IntegrationFailure {
        /// IntegrationFailure failure message
        message: String,
    },
}

impl TeleportError {
    pub(crate) fn dimension_mismatch(expected: usize, found: usize, context: &str) -> Self {
        TeleportError::DimensionMismatch {
            message: format!("{context}: expected dimension {expected}, found {found}"),
        }
    }
}
