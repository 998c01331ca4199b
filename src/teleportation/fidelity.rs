// src/teleportation/fidelity.rs

//! Branch-resolved fidelity of one protocol run.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::core::{QuantumState, StateVector, TeleportError};
use crate::simulation::{FidelityReport, FidelityTally, MeasurementOutcome, projective_measurement};
use crate::teleportation::TeleportationPipeline;
use crate::teleportation::topology::Topology;

/// Correction applied to a first-round branch before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCorrection {
    /// Z braiding, for `(c1, c2) = (0, 0)`.
    Z,
    /// XX braiding, for `(0, 1)`.
    XX,
    /// XX braiding followed by Z braiding, for `(1, 0)`.
    XXThenZ,
    /// Nothing, for `(1, 1)`.
    Identity,
}

impl BranchCorrection {
    /// Correction selected by the classical bits `c1` and `c2`.
    pub fn from_bits(c1: u8, c2: u8) -> Self {
        match (c1 & 1, c2 & 1) {
            (0, 0) => BranchCorrection::Z,
            (0, 1) => BranchCorrection::XX,
            (1, 0) => BranchCorrection::XXThenZ,
            _ => BranchCorrection::Identity,
        }
    }

    /// Reads `c1` and `c2` out of first-round outcome bits at the positions
    /// given by the topology.
    pub fn for_outcome(topology: &Topology, bits: &[u8]) -> Result<Self, TeleportError> {
        let (p1, p2) = topology.correction_bits;
        match (bits.get(p1), bits.get(p2)) {
            (Some(&c1), Some(&c2)) => Ok(Self::from_bits(c1, c2)),
            _ => Err(TeleportError::InvalidOperation {
                message: format!("Outcome {bits:?} has no correction bits at positions {p1} and {p2}"),
            }),
        }
    }

    /// Applies the correction through `pipeline`.
    pub fn apply<P>(self, pipeline: &P, state: QuantumState) -> Result<QuantumState, TeleportError>
    where
        P: TeleportationPipeline + ?Sized,
    {
        match self {
            BranchCorrection::Z => pipeline.z_braiding(state),
            BranchCorrection::XX => pipeline.xx_braiding(state),
            BranchCorrection::XXThenZ => pipeline.z_braiding(pipeline.xx_braiding(state)?),
            BranchCorrection::Identity => Ok(state),
        }
    }
}

impl fmt::Display for BranchCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BranchCorrection::Z => "Z",
            BranchCorrection::XX => "XX",
            BranchCorrection::XXThenZ => "XX+Z",
            BranchCorrection::Identity => "I",
        };
        write!(f, "{name}")
    }
}

/// Teleports `psi` through `pipeline` and reports how well it arrives.
///
/// The encoded register is measured on the Bell qubits; each branch gets the
/// braiding correction its bits call for, is decoded and measured again on
/// the output qubits. Every final sub-branch is compared with the ideal state
/// (measured qubits in their observed basis states, `psi` at the output slot).
/// Overlaps and weights are summed over all sub-branches and over the
/// post-selected ones, and the two ratios are returned without guarding
/// against zero denominators.
pub fn simulate_teleportation<P>(psi: &StateVector, pipeline: &P) -> Result<FidelityReport, TeleportError>
where
    P: TeleportationPipeline + ?Sized,
{
    let topology = pipeline.topology();
    let encoded = pipeline.teleport(psi)?;
    let branches = projective_measurement(&encoded, &topology.mask(topology.bell_qubits), false)?;

    #[cfg(feature = "parallel")]
    let tallies = branches
        .into_par_iter()
        .map(|branch| branch_tally(pipeline, psi, branch))
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let tallies = branches
        .into_iter()
        .map(|branch| branch_tally(pipeline, psi, branch))
        .collect::<Result<Vec<_>, _>>()?;

    let report = tallies.into_iter().fold(FidelityTally::new(), |acc, t| acc + t).report();
    if report.is_finite() {
        info!(%report, "teleportation run finished");
    } else {
        warn!(%report, "teleportation run produced a non-finite fidelity");
    }
    Ok(report)
}

fn branch_tally<P>(pipeline: &P, psi: &StateVector, branch: MeasurementOutcome) -> Result<FidelityTally, TeleportError>
where
    P: TeleportationPipeline + ?Sized,
{
    let mut tally = FidelityTally::new();
    if branch.weight == 0.0 {
        return Ok(tally);
    }
    let topology = pipeline.topology();
    let corrected = BranchCorrection::for_outcome(topology, &branch.bits)?.apply(pipeline, branch.state)?;
    let decoded = pipeline.decode(corrected)?;
    let outputs = projective_measurement(&decoded, &topology.mask(topology.output_qubits), false)?;
    for output in outputs {
        let expected = topology.expected_state(&branch.bits, &output.bits, psi)?;
        let overlap = output.state.overlap_with(&expected)?;
        tally.record(overlap, output.weight, topology.is_post_selected(&branch.bits, &output.bits));
    }
    Ok(tally)
}
