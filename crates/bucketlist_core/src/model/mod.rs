//! Domain model for stored places.
//!
//! # Responsibility
//! - Define the record shape shared by the store, the repository and FFI.
//!
//! # Invariants
//! - Every place is identified by a stable `LocationId`.

pub mod location;
