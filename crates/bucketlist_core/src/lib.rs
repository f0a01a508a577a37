//! Core domain logic for BucketList.
//! This crate is the single source of truth for place storage and access
//! gating invariants.

pub mod auth;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::gate::{AccessGate, AccessState, AUTH_UNAVAILABLE_MESSAGE, UNLOCK_REASON};
pub use auth::verifier::{
    BiometricVerifier, HostReportedVerifier, StaticVerifier, VerificationOutcome,
    VerifierUnavailable,
};
pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::location::{Coordinate, Location, LocationId, DEFAULT_LOCATION_NAME};
pub use repo::location_repo::{
    InMemoryLocationRepository, JsonFileLocationRepository, LocationRepository, RepoError,
    RepoResult, StagedWrite,
};
pub use service::location_store::{
    LocationStore, SaveOutcome, SharedLocationStore, StoreEvent, UpdateOutcome,
};
pub use service::session::{PlacesSession, SessionError, SessionResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
