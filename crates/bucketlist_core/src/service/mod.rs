//! Core use-case services.
//!
//! # Responsibility
//! - Own the place collection and its persistence discipline.
//! - Compose the access gate with the store for presentation hosts.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod location_store;
pub mod session;
