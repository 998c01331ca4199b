// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod operator;
pub mod state;

// Re-export public types for convenient access via `majorana_teleport::core::TypeName`
pub use error::TeleportError;
pub use operator::{Operator, tensor};
pub use state::{DensityMatrix, InputState, QuantumState, StateVector, bloch_states, random_ket};
