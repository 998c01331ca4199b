// src/simulation/results.rs
use std::fmt;
use std::ops::{Add, AddAssign};

/// Outcome of one teleportation protocol run.
///
/// Both values are plain ratios of accumulated overlaps to accumulated branch
/// weights. A zero denominator is not guarded, so either field may be NaN or
/// infinite; use [`FidelityReport::is_finite`] to detect that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FidelityReport {
    /// Fidelity restricted to the branches whose discarded bits are all zero.
    pub post_selected: f64,
    /// Fidelity over every measurement branch.
    pub all_branches: f64,
}

impl FidelityReport {
    /// `true` when neither ratio is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.post_selected.is_finite() && self.all_branches.is_finite()
    }
}

impl fmt::Display for FidelityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "post-selected fidelity: {:.10}, all-branch fidelity: {:.10}",
            self.post_selected, self.all_branches
        )
    }
}

/// Running numerator/denominator pairs of the fidelity ratios.
///
/// Each first-round branch fills its own tally; tallies are merged with `+`
/// once every branch is done, so no accumulator is ever shared.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FidelityTally {
    /// Σ overlap over post-selected sub-branches.
    pub post_overlap: f64,
    /// Σ weight over post-selected sub-branches.
    pub post_weight: f64,
    /// Σ overlap over every sub-branch.
    pub all_overlap: f64,
    /// Σ weight over every sub-branch.
    pub all_weight: f64,
}

impl FidelityTally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one final sub-branch.
    pub fn record(&mut self, overlap: f64, weight: f64, post_selected: bool) {
        if post_selected {
            self.post_overlap += overlap;
            self.post_weight += weight;
        }
        self.all_overlap += overlap;
        self.all_weight += weight;
    }

    /// The two ratios, unguarded.
    pub fn report(&self) -> FidelityReport {
        FidelityReport {
            post_selected: self.post_overlap / self.post_weight,
            all_branches: self.all_overlap / self.all_weight,
        }
    }
}

impl AddAssign for FidelityTally {
    fn add_assign(&mut self, other: Self) {
        self.post_overlap += other.post_overlap;
        self.post_weight += other.post_weight;
        self.all_overlap += other.all_overlap;
        self.all_weight += other.all_weight;
    }
}

impl Add for FidelityTally {
    type Output = FidelityTally;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}
