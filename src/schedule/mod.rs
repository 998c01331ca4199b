// src/schedule/mod.rs

//! Ordered stage sequences applied to a running state.
//!
//! A [`Schedule`] is generic over its stage type, so the two ways of driving a
//! register never mix: `Schedule<Operator>` applies gates directly and
//! `Schedule<TimedStage>` evolves under Hamiltonians for a given duration.
//! Order matters; stages generally do not commute.

use std::fmt;

use tracing::debug;

use crate::core::{Operator, QuantumState, TeleportError};
use crate::simulation::{EvolutionOptions, evolve_state};

/// Environment shared by every stage of one schedule run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageContext<'a> {
    /// Lindblad jump operators applied during timed stages.
    pub dissipators: &'a [Operator],
    /// Integrator settings for timed stages.
    pub options: EvolutionOptions,
}

impl<'a> StageContext<'a> {
    /// Closed-system context with default integrator settings.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Context with the given jump operators and integrator settings.
    pub fn open(dissipators: &'a [Operator], options: EvolutionOptions) -> Self {
        Self { dissipators, options }
    }
}

/// One step of a schedule.
pub trait Stage: fmt::Debug + Send + Sync {
    /// Consumes the running state and returns the next one.
    fn apply(&self, state: QuantumState, ctx: &StageContext<'_>) -> Result<QuantumState, TeleportError>;

    /// Short human-readable description used in logs and listings.
    fn summary(&self) -> String;
}

/// Unitary mode: `Uψ` for a vector, `UρU†` for a density operator. The
/// context is irrelevant; gates are instantaneous.
impl Stage for Operator {
    fn apply(&self, state: QuantumState, _ctx: &StageContext<'_>) -> Result<QuantumState, TeleportError> {
        state.apply_unitary(self)
    }

    fn summary(&self) -> String {
        format!("unitary on {} qubits ({} non-zeros)", self.num_qubits(), self.nnz())
    }
}

/// Timed mode: a Hamiltonian, an optional corrective unitary and a duration.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedStage {
    /// Name used in logs.
    pub label: String,
    /// Generator of the evolution.
    pub hamiltonian: Operator,
    /// Applied after the evolution when present.
    pub correction: Option<Operator>,
    /// Nominal duration; the state is evolved for half of it.
    pub duration: f64,
}

impl TimedStage {
    /// Stage without a correction.
    pub fn new(label: impl Into<String>, hamiltonian: Operator, duration: f64) -> Self {
        Self { label: label.into(), hamiltonian, correction: None, duration }
    }

    /// Attaches the corrective unitary applied after evolving.
    pub fn with_correction(mut self, correction: Operator) -> Self {
        self.correction = Some(correction);
        self
    }
}

impl Stage for TimedStage {
    fn apply(&self, state: QuantumState, ctx: &StageContext<'_>) -> Result<QuantumState, TeleportError> {
        debug!(stage = %self.label, duration = self.duration, "timed stage");
        let evolved = evolve_state(&self.hamiltonian, self.duration / 2.0, &state, ctx.dissipators, &ctx.options)?;
        match &self.correction {
            Some(u) => evolved.correct(u),
            None => Ok(evolved),
        }
    }

    fn summary(&self) -> String {
        let corrected = if self.correction.is_some() { " + correction" } else { "" };
        format!("{} (t = {:.4}){}", self.label, self.duration, corrected)
    }
}

/// An ordered sequence of stages of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule<S: Stage> {
    stages: Vec<S>,
}

impl<S: Stage> Schedule<S> {
    /// Creates a new, empty schedule.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends one stage.
    pub fn add_stage(&mut self, stage: S) {
        self.stages.push(stage);
    }

    /// Appends every stage of an iterator, in order.
    pub fn add_stages<I>(&mut self, stages: I)
    where
        I: IntoIterator<Item = S>,
    {
        self.stages.extend(stages);
    }

    /// The stages in execution order.
    pub fn stages(&self) -> &[S] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the schedule has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order on `initial`.
    ///
    /// The first failing stage aborts the run with its error.
    pub fn run(&self, initial: QuantumState, ctx: &StageContext<'_>) -> Result<QuantumState, TeleportError> {
        self.stages.iter().try_fold(initial, |state, stage| stage.apply(state, ctx))
    }
}

impl<S: Stage> Default for Schedule<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Stage> fmt::Display for Schedule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schedule[{} stages]", self.stages.len())?;
        for (i, stage) in self.stages.iter().enumerate() {
            writeln!(f, "  {:>3}: {}", i, stage.summary())?;
        }
        Ok(())
    }
}

/// Method-chaining constructor for [`Schedule`].
#[derive(Debug)]
pub struct ScheduleBuilder<S: Stage> {
    schedule: Schedule<S>,
}

impl<S: Stage> ScheduleBuilder<S> {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self { schedule: Schedule::new() }
    }

    /// Adds a single stage. Returns `self` for chaining.
    pub fn add_stage(mut self, stage: S) -> Self {
        self.schedule.add_stage(stage);
        self
    }

    /// Adds several stages in order. Returns `self` for chaining.
    pub fn add_stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.schedule.add_stages(stages);
        self
    }

    /// Finishes construction.
    pub fn build(self) -> Schedule<S> {
        self.schedule
    }
}

impl<S: Stage> Default for ScheduleBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StateVector, bloch_states};
    use crate::hamiltonians::{hadamard_correction, hadamard_hamiltonian};
    use crate::operations::{hadamard_gate, sigma_x, sigma_z};
    use std::f64::consts::PI;

    #[test]
    fn unitary_schedule_applies_stages_in_order() -> Result<(), TeleportError> {
        // H then Z maps |0> to |->, Z then H maps |0> to |+>
        let zero = QuantumState::Pure(StateVector::basis(0));
        let hz = ScheduleBuilder::new()
            .add_stage(hadamard_gate(1, 0)?)
            .add_stage(sigma_z(1, 0)?)
            .build();
        let zh = ScheduleBuilder::new()
            .add_stages([sigma_z(1, 0)?, hadamard_gate(1, 0)?])
            .build();
        let ctx = StageContext::closed();
        let minus = QuantumState::Pure(bloch_states()[3].clone());
        let plus = QuantumState::Pure(bloch_states()[2].clone());
        assert!(hz.run(zero.clone(), &ctx)?.max_distance(&minus).unwrap_or(1.0) < 1e-12);
        assert!(zh.run(zero, &ctx)?.max_distance(&plus).unwrap_or(1.0) < 1e-12);
        Ok(())
    }

    #[test]
    fn unitary_stage_conjugates_mixed_state() -> Result<(), TeleportError> {
        let rho = QuantumState::Mixed(StateVector::basis(0).to_density());
        let out = sigma_x(1, 0)?.apply(rho, &StageContext::closed())?;
        let expected = QuantumState::Mixed(StateVector::basis(1).to_density());
        assert!(out.max_distance(&expected).unwrap_or(1.0) < 1e-15);
        Ok(())
    }

    #[test]
    fn timed_hadamard_stage_matches_gate() -> Result<(), TeleportError> {
        let stage = TimedStage::new("hadamard", hadamard_hamiltonian(1, &[0])?, PI)
            .with_correction(hadamard_correction(1, &[0])?);
        let schedule = ScheduleBuilder::new().add_stage(stage).build();
        for psi in bloch_states() {
            let expected = QuantumState::Pure(StateVector::from_vector(hadamard_gate(1, 0)?.apply_to(psi.vector()))?);
            let out = schedule.run(QuantumState::Pure(psi), &StageContext::closed())?;
            assert!(out.max_distance(&expected).unwrap_or(1.0) < 1e-8);
        }
        Ok(())
    }

    #[test]
    fn timed_stage_corrects_mixed_state_by_conjugation() -> Result<(), TeleportError> {
        // A zero-rate dissipator forces the density-operator path; the result
        // must match the pure-state pipeline.
        let stage = TimedStage::new("hadamard", hadamard_hamiltonian(1, &[0])?, PI)
            .with_correction(hadamard_correction(1, &[0])?);
        let idle = [sigma_z(1, 0)? * 0.0];
        let ctx = StageContext::open(&idle, EvolutionOptions::default());
        let out = stage.apply(QuantumState::Pure(StateVector::basis(0)), &ctx)?;
        let expected = QuantumState::Mixed(bloch_states()[2].to_density());
        assert!(out.max_distance(&expected).unwrap_or(1.0) < 1e-8);
        Ok(())
    }

    #[test]
    fn failing_stage_aborts_schedule() -> Result<(), TeleportError> {
        let schedule = ScheduleBuilder::new()
            .add_stage(hadamard_gate(1, 0)?)
            .add_stage(hadamard_gate(2, 0)?)
            .build();
        let err = schedule
            .run(QuantumState::Pure(StateVector::basis(0)), &StageContext::closed())
            .unwrap_err();
        assert!(matches!(err, TeleportError::DimensionMismatch { .. }));
        Ok(())
    }

    #[test]
    fn display_lists_stages() -> Result<(), TeleportError> {
        let schedule = ScheduleBuilder::new()
            .add_stage(TimedStage::new("cz", sigma_z(1, 0)?, PI))
            .build();
        let listing = schedule.to_string();
        assert!(listing.contains("Schedule[1 stages]"));
        assert!(listing.contains("cz (t = 3.1416)"));
        Ok(())
    }
}
