//! Warden common core types.
//!
//! Strongly-typed, prefixed identifiers shared by every Warden crate.

pub mod id;

pub use id::*;
