//! Teleports one input state through both realizations of the protocol and
//! prints their fidelity reports.
//!
//! ```text
//! cargo run --release --example teleport_fidelity -- yp --gamma 0.05
//! ```

use clap::Parser;
use majorana_teleport::teleportation::{circuit_teleportation, continuous_teleportation, dephasing_dissipators};
use majorana_teleport::{
    CircuitPipeline, ContinuousPipeline, EvolutionOptions, InputState, QuantumState, TeleportError, Topology,
    simulate_teleportation,
};

/// Braided Majorana teleportation: circuit vs continuous evolution.
#[derive(Debug, Parser)]
#[command(after_help = "For the input state use z0, z1, xp, xm, yp, ym or rnd")]
struct Args {
    /// State to be teleported
    psi: InputState,
    /// Dephasing rate applied to every qubit of the continuous run (0 = closed system)
    #[arg(long, default_value_t = 0.0)]
    gamma: f64,
    /// Number of time points per evolution stage
    #[arg(long, default_value_t = 200)]
    resolution: usize,
}

fn main() -> Result<(), TeleportError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let psi = args.psi.to_state(&mut rand::rng());
    println!("Teleporting {} = {}", args.psi, psi);

    let encoded_circuit = circuit_teleportation(&psi)?;
    let encoded_continuous = continuous_teleportation(&psi, Vec::new())?;
    if let (QuantumState::Pure(a), QuantumState::Pure(b)) = (&encoded_circuit, &encoded_continuous) {
        println!("Encoding overlap (circuit vs continuous): {:.12}", a.inner(b)?.norm());
    }

    let circuit = CircuitPipeline::new()?;
    println!("Circuit:    {}", simulate_teleportation(&psi, &circuit)?);

    let mut continuous = ContinuousPipeline::new()?.with_options(EvolutionOptions::new().with_resolution(args.resolution));
    if args.gamma > 0.0 {
        continuous = continuous.with_dissipators(dephasing_dissipators(Topology::BRAIDING.num_qubits, args.gamma)?);
    }
    println!("Continuous: {}", simulate_teleportation(&psi, &continuous)?);
    Ok(())
}
