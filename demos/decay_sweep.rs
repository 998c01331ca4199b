//! Sweeps the dephasing rate and prints post-selected and general fidelity
//! for each value.
//!
//! ```text
//! cargo run --release --example decay_sweep -- z0 --res 3 --gamma 1.0
//! ```

use clap::Parser;
use majorana_teleport::{EvolutionOptions, InputState, TeleportError, sweep_decay_rates};

/// Majorana braiding circuit simulation using Lindblad dynamics with decoherence.
#[derive(Debug, Parser)]
#[command(after_help = "For the input state use z0, z1, xp, xm, yp, ym or rnd")]
struct Args {
    /// State to be teleported
    psi: InputState,
    /// Number of decoherence runs
    #[arg(long, default_value_t = 3)]
    res: usize,
    /// Maximum decay rate
    #[arg(long, default_value_t = 1.0)]
    gamma: f64,
}

fn main() -> Result<(), TeleportError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let psi = args.psi.to_state(&mut rand::rng());

    let table = sweep_decay_rates(&psi, args.gamma, args.res, EvolutionOptions::default())?;
    print!("{table}");
    Ok(())
}
