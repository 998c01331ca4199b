// src/teleportation/sweep.rs

//! Fidelity as a function of the dephasing rate.

use std::fmt;

use num_complex::Complex;
use tracing::info;

use crate::core::{Operator, StateVector, TeleportError};
use crate::operations::sigma_z;
use crate::simulation::EvolutionOptions;
use crate::teleportation::TeleportationPipeline;
use crate::teleportation::continuous::ContinuousPipeline;
use crate::teleportation::fidelity::simulate_teleportation;

/// `√γ Z_i` on every qubit of the register.
///
/// Operators are returned even for `γ = 0`, so the evolution still runs on
/// density operators.
pub fn dephasing_dissipators(num_qubits: usize, gamma: f64) -> Result<Vec<Operator>, TeleportError> {
    if gamma.is_nan() || gamma < 0.0 {
        return Err(TeleportError::InvalidConfiguration {
            message: format!("Decay rate must be non-negative, got {gamma}"),
        });
    }
    let rate = Complex::new(gamma.sqrt(), 0.0);
    (0..num_qubits)
        .map(|i| sigma_z(num_qubits, i).map(|z| z.scaled(rate)))
        .collect()
}

/// `points` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (points - 1) as f64;
            (0..points)
                .map(|i| if i == points - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Fidelities over a range of decay rates, one column per rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepTable {
    /// Decay rates.
    pub gammas: Vec<f64>,
    /// Post-selected fidelity at each rate.
    pub post_selected: Vec<f64>,
    /// All-branch fidelity at each rate.
    pub general: Vec<f64>,
}

impl SweepTable {
    /// Number of swept rates.
    pub fn len(&self) -> usize {
        self.gammas.len()
    }

    /// Returns `true` if no rate was swept.
    pub fn is_empty(&self) -> bool {
        self.gammas.is_empty()
    }

    /// The three rows in order: rates, post-selected, general.
    pub fn rows(&self) -> [&[f64]; 3] {
        [self.gammas.as_slice(), self.post_selected.as_slice(), self.general.as_slice()]
    }
}

impl fmt::Display for SweepTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, row) in ["gamma", "post-selected", "general"].iter().zip(self.rows()) {
            write!(f, "{name:<14}")?;
            for value in row {
                write!(f, " {value:>12.8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Runs the continuous protocol for `points` decay rates evenly spread over
/// `[0, gamma_max]`, with dephasing on every qubit.
pub fn sweep_decay_rates(
    psi: &StateVector,
    gamma_max: f64,
    points: usize,
    options: EvolutionOptions,
) -> Result<SweepTable, TeleportError> {
    if points == 0 {
        return Err(TeleportError::InvalidConfiguration {
            message: "A decay-rate sweep needs at least one point".to_string(),
        });
    }
    let base = ContinuousPipeline::new()?.with_options(options);
    let num_qubits = base.topology().num_qubits;
    let mut table = SweepTable::default();
    for gamma in linspace(0.0, gamma_max, points) {
        let pipeline = base.clone().with_dissipators(dephasing_dissipators(num_qubits, gamma)?);
        let report = simulate_teleportation(psi, &pipeline)?;
        info!(gamma, %report, "sweep point");
        table.gammas.push(gamma);
        table.post_selected.push(report.post_selected);
        table.general.push(report.all_branches);
    }
    Ok(table)
}
