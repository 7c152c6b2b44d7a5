//! Test infrastructure for fabric-cablecheck
//!
//! Provides:
//! - LLDP dump, inventory and topology text builders
//! - Temporary on-disk fabric snapshots for end-to-end runs
//! - Structural graph checks and port status lookups

pub mod fabric;
pub mod fixtures;
mod verification;

pub use fabric::{FabricFixture, FixtureError, FixtureResult};
pub use fixtures::*;
pub use verification::*;
