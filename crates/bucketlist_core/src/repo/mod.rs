//! Repository layer for durable place storage.
//!
//! # Responsibility
//! - Define the whole-collection read/write contract.
//! - Isolate file-system and JSON details from the store.
//!
//! # Invariants
//! - The collection is always read and written as one unit, never per record.

pub mod location_repo;
