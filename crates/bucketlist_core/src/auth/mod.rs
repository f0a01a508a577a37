//! Access control in front of the place store.
//!
//! # Responsibility
//! - Model the Locked/Unlocked gate and its error reporting.
//! - Define the host verification contract the gate drives.

pub mod gate;
pub mod verifier;
