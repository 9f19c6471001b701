//! Configuration types for Warden.
//!
//! This crate provides the configuration used by the Warden control plane,
//! read from `.warden/config.yaml` with `${VAR}` expansion.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
