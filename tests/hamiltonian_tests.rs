// tests/hamiltonian_tests.rs

use majorana_teleport::core::random_ket;
use majorana_teleport::hamiltonians::{cz_hamiltonian, hadamard_correction, hadamard_hamiltonian};
use majorana_teleport::operations::{cz_gate, hadamard_gate};
use majorana_teleport::{
    EvolutionOptions, QuantumState, StateVector, TeleportError, bloch_states, check_hermitian,
    check_projector_completeness, derive_unitary, evolve_state, projective_measurement,
};
use num_complex::Complex;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::PI;

// Bloch states plus one seeded random state
fn test_states() -> Vec<StateVector> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut states = bloch_states().to_vec();
    states.push(random_ket(&mut rng));
    states
}

// Asserts <expected|actual> ≈ 1, phase included
fn assert_overlap_one(expected: &[Complex<f64>], actual: &QuantumState, tolerance: f64, context: &str) {
    let QuantumState::Pure(actual) = actual else {
        panic!("{context}: expected a pure state");
    };
    let overlap: Complex<f64> = expected.iter().zip(actual.amplitudes()).map(|(e, a)| e.conj() * a).sum();
    assert!(
        (overlap - Complex::new(1.0, 0.0)).norm() < tolerance,
        "{context}: overlap {overlap} not within {tolerance} of 1"
    );
}

#[test]
fn test_hadamard_unitary() -> Result<(), TeleportError> {
    let h = hadamard_hamiltonian(1, &[0])?;
    let corrected = &hadamard_correction(1, &[0])? * &derive_unitary(&h, PI);
    assert!(corrected.approx_eq(&hadamard_gate(1, 0)?, 1e-10));
    check_hermitian(&h, None)
}

#[test]
fn test_hadamard_unitary_multi() -> Result<(), TeleportError> {
    let h = hadamard_hamiltonian(2, &[0, 1])?;
    let corrected = &hadamard_correction(2, &[0, 1])? * &derive_unitary(&h, PI);
    let expected = &hadamard_gate(2, 0)? * &hadamard_gate(2, 1)?;
    assert!(corrected.approx_eq(&expected, 1e-10));
    check_hermitian(&h, None)
}

#[test]
fn test_hadamard_hamiltonian_evolution() -> Result<(), TeleportError> {
    let t = PI;
    let h = hadamard_hamiltonian(1, &[0])?;
    let gate = hadamard_gate(1, 0)?;
    let correction = hadamard_correction(1, &[0])?;
    for psi0 in test_states() {
        let expected = gate.apply_to(psi0.vector());
        let evolved = evolve_state(&h, t / 2.0, &QuantumState::Pure(psi0), &[], &EvolutionOptions::default())?;
        let corrected = evolved.correct(&correction)?;
        assert_overlap_one(expected.as_slice(), &corrected, 1e-8, "hadamard evolution");
    }
    Ok(())
}

#[test]
fn test_cz_unitary() -> Result<(), TeleportError> {
    let h = cz_hamiltonian(2, &[0], &[1])?;
    assert!(derive_unitary(&h, PI).approx_eq(&cz_gate(2, 0, 1)?, 1e-10));
    check_hermitian(&h, None)
}

#[test]
fn test_cz_hamiltonian_evolution_on_all_pairs() -> Result<(), TeleportError> {
    let t = PI;
    let h = cz_hamiltonian(2, &[0], &[1])?;
    let gate = cz_gate(2, 0, 1)?;
    let states = test_states();
    for a in &states {
        for b in &states {
            let psi0 = StateVector::tensor(&[a.clone(), b.clone()])?;
            let expected = gate.apply_to(psi0.vector());
            let evolved = evolve_state(&h, t / 2.0, &QuantumState::Pure(psi0), &[], &EvolutionOptions::default())?;
            assert_overlap_one(expected.as_slice(), &evolved, 1e-4, "cz evolution");
        }
    }
    Ok(())
}

#[test]
fn test_cz_hamiltonian_on_disjoint_pairs() -> Result<(), TeleportError> {
    let t = PI;
    let h1 = cz_hamiltonian(4, &[0], &[1])?;
    let h2 = cz_hamiltonian(4, &[2], &[3])?;
    let gates = &cz_gate(4, 2, 3)? * &cz_gate(4, 0, 1)?;
    let [z0, z1, xp, xm, _, _] = bloch_states();
    let options = EvolutionOptions::default();
    for a in [&z0, &z1] {
        for b in [&xp, &xm] {
            for c in [&z0, &z1] {
                for d in [&xp, &xm] {
                    let psi0 = StateVector::tensor(&[a.clone(), b.clone(), c.clone(), d.clone()])?;
                    let expected = gates.apply_to(psi0.vector());
                    let mid = evolve_state(&h1, t / 2.0, &QuantumState::Pure(psi0), &[], &options)?;
                    let out = evolve_state(&h2, t / 2.0, &mid, &[], &options)?;
                    assert_overlap_one(expected.as_slice(), &out, 1e-4, "disjoint cz evolution");
                }
            }
        }
    }
    check_hermitian(&h1, None)?;
    check_hermitian(&h2, None)
}

fn distinct_pairs(n: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..n, 0..n), 1..4).prop_filter("control and target must differ", |pairs| {
        pairs.iter().all(|(c, t)| c != t)
    })
}

proptest! {
    #[test]
    fn prop_hadamard_hamiltonian_is_hermitian(targets in prop::collection::btree_set(0usize..5, 1..5)) {
        let targets: Vec<usize> = targets.into_iter().collect();
        let h = hadamard_hamiltonian(5, &targets).unwrap();
        prop_assert!(check_hermitian(&h, None).is_ok());
    }

    #[test]
    fn prop_cz_hamiltonian_is_hermitian(pairs in distinct_pairs(5)) {
        let (controls, targets): (Vec<usize>, Vec<usize>) = pairs.into_iter().unzip();
        let h = cz_hamiltonian(5, &controls, &targets).unwrap();
        prop_assert!(check_hermitian(&h, None).is_ok());
    }

    #[test]
    fn prop_measurement_branches_are_complete(
        seed in any::<u64>(),
        mask in prop::collection::vec(any::<bool>(), 3),
        mixed in any::<bool>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let factors: Vec<StateVector> = (0..3).map(|_| random_ket(&mut rng)).collect();
        let psi = StateVector::tensor(&factors).unwrap();
        let state = if mixed { QuantumState::Mixed(psi.to_density()) } else { QuantumState::Pure(psi) };
        let outcomes = projective_measurement(&state, &mask, false).unwrap();
        prop_assert_eq!(outcomes.len(), 1usize << mask.iter().filter(|&&m| m).count());
        prop_assert!(check_projector_completeness(&state, &outcomes, None).is_ok());
    }
}
