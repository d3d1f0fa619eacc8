//! Validation utilities
//!
//! Checks that the engine's indexes agree with each other

mod consistency;

pub use consistency::{check_consistency, ConsistencyReport};
