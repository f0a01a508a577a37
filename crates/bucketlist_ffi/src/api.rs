//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the gated place session to Dart via FRB.
//! - Translate core records into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Place reads and writes are refused while the gate is locked.
//! - One process-wide session; the gate starts locked on every launch.

use bucketlist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Coordinate, HostReportedVerifier, JsonFileLocationRepository, Location, LocationId,
    PlacesSession, StoreConfig, UpdateOutcome, VerificationOutcome,
};
use log::warn;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use uuid::Uuid;

type FfiSession = PlacesSession<JsonFileLocationRepository, HostReportedVerifier>;

static SESSION: OnceLock<Mutex<FfiSession>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Flat place record for Dart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceItem {
    /// Stable place ID in string form.
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Gate state snapshot for rendering the lock screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateStatusResponse {
    pub unlocked: bool,
    /// Empty unless the host could not run verification.
    pub auth_error_message: String,
    /// Whether the error alert should be visible.
    pub showing_auth_error: bool,
}

/// Place list envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacesListResponse {
    pub ok: bool,
    /// Places in insertion order (empty while locked).
    pub items: Vec<PlaceItem>,
    pub message: String,
}

/// Add/update result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceActionResponse {
    pub ok: bool,
    /// Created or updated place ID.
    pub place_id: Option<String>,
    /// `added|replaced|stale_selection|no_selection` on success.
    pub outcome: String,
    pub message: String,
}

impl PlaceActionResponse {
    fn success(outcome: &str, message: impl Into<String>, place_id: Option<LocationId>) -> Self {
        Self {
            ok: true,
            place_id: place_id.map(|id| id.to_string()),
            outcome: outcome.to_string(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            place_id: None,
            outcome: String::new(),
            message: message.into(),
        }
    }
}

/// Current gate state.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_status() -> GateStatusResponse {
    gate_status_in(&lock_session())
}

/// Runs one unlock attempt with the result of the platform's biometric prompt.
///
/// Input semantics:
/// - `biometrics_available`: whether the device can evaluate biometrics.
/// - `verified`: whether the prompt succeeded; ignored when unavailable.
///
/// # FFI contract
/// - Never panics.
/// - Returns the gate state after the attempt.
pub fn gate_authenticate(biometrics_available: bool, verified: bool) -> GateStatusResponse {
    authenticate_in(&mut lock_session(), biometrics_available, verified)
}

/// Hides the authentication error alert.
#[flutter_rust_bridge::frb(sync)]
pub fn gate_dismiss_error() -> GateStatusResponse {
    let mut session = lock_session();
    session.dismiss_auth_error();
    gate_status_in(&session)
}

/// Lists stored places.
#[flutter_rust_bridge::frb(sync)]
pub fn places_list() -> PlacesListResponse {
    list_in(&lock_session())
}

/// Adds a place at the tapped coordinate.
#[flutter_rust_bridge::frb(sync)]
pub fn places_add(latitude: f64, longitude: f64) -> PlaceActionResponse {
    add_in(&mut lock_session(), latitude, longitude)
}

/// Replaces the selected place with `edited`.
///
/// Input semantics:
/// - `selected_id`: the place the edit sheet was opened for, `None` when
///   nothing is selected.
/// - `edited`: new field values; its `id` is informational only.
#[flutter_rust_bridge::frb(sync)]
pub fn places_update(selected_id: Option<String>, edited: PlaceItem) -> PlaceActionResponse {
    update_in(&mut lock_session(), selected_id, edited)
}

fn lock_session() -> MutexGuard<'static, FfiSession> {
    SESSION
        .get_or_init(|| Mutex::new(open_session(resolve_config())))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn resolve_config() -> StoreConfig {
    let config = StoreConfig::from_env();
    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            warn!("event=config_resolve module=ffi status=fallback error={err}");
            StoreConfig::new(std::env::temp_dir())
        }
    }
}

fn open_session(config: StoreConfig) -> FfiSession {
    PlacesSession::new(
        JsonFileLocationRepository::new(config.save_path()),
        HostReportedVerifier::new(),
    )
}

fn gate_status_in(session: &FfiSession) -> GateStatusResponse {
    let gate = session.gate();
    GateStatusResponse {
        unlocked: gate.is_unlocked(),
        auth_error_message: gate.auth_error_message().to_string(),
        showing_auth_error: gate.showing_auth_error(),
    }
}

fn authenticate_in(
    session: &mut FfiSession,
    biometrics_available: bool,
    verified: bool,
) -> GateStatusResponse {
    let outcome = if verified {
        VerificationOutcome::Verified
    } else {
        VerificationOutcome::Failed
    };
    session.gate().verifier().report(biometrics_available, outcome);

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!(
                "event=auth_attempt module=ffi status=error error_code=runtime_unavailable error={}",
                err
            );
            return gate_status_in(session);
        }
    };
    runtime.block_on(session.authenticate());
    gate_status_in(session)
}

fn list_in(session: &FfiSession) -> PlacesListResponse {
    match session.locations() {
        Ok(locations) => {
            let items = locations.iter().map(to_place_item).collect::<Vec<_>>();
            let message = format!("{} place(s).", items.len());
            PlacesListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(err) => PlacesListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("places_list failed: {err}"),
        },
    }
}

fn add_in(session: &mut FfiSession, latitude: f64, longitude: f64) -> PlaceActionResponse {
    match session.add(Coordinate::new(latitude, longitude)) {
        Ok(id) => PlaceActionResponse::success("added", "Place added.", Some(id)),
        Err(err) => PlaceActionResponse::failure(format!("places_add failed: {err}")),
    }
}

fn update_in(
    session: &mut FfiSession,
    selected_id: Option<String>,
    edited: PlaceItem,
) -> PlaceActionResponse {
    let selected = match selected_id.as_deref().map(str::trim) {
        None => None,
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(selection_for(session, id)),
            Err(err) => {
                return PlaceActionResponse::failure(format!(
                    "places_update failed: invalid selected_id `{raw}`: {err}"
                ));
            }
        },
    };

    let edited_id = selected
        .as_ref()
        .map(|location| location.id)
        .or_else(|| Uuid::parse_str(edited.id.trim()).ok())
        .unwrap_or_else(Uuid::nil);
    let edited = Location::with_id(
        edited_id,
        edited.name,
        edited.description,
        Coordinate::new(edited.latitude, edited.longitude),
    );

    match session.update(selected.as_ref(), edited) {
        Ok(outcome) => {
            let place_id = selected.as_ref().map(|location| location.id);
            let message = match outcome {
                UpdateOutcome::Replaced => "Place updated.",
                UpdateOutcome::StaleSelection => "Selected place no longer exists.",
                UpdateOutcome::NoSelection => "No place selected.",
            };
            PlaceActionResponse::success(outcome.as_str(), message, place_id)
        }
        Err(err) => PlaceActionResponse::failure(format!("places_update failed: {err}")),
    }
}

/// Stored record for `id`, or a placeholder carrying only the id so the
/// store sees a stale selection.
fn selection_for(session: &FfiSession, id: LocationId) -> Location {
    session
        .locations()
        .ok()
        .and_then(|locations| locations.iter().find(|location| location.id == id).cloned())
        .unwrap_or_else(|| Location::with_id(id, "", "", Coordinate::default()))
}

fn to_place_item(location: &Location) -> PlaceItem {
    PlaceItem {
        id: location.id.to_string(),
        name: location.name.clone(),
        description: location.description.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        add_in, authenticate_in, core_version, gate_status, init_logging, list_in, open_session,
        ping, update_in, PlaceItem,
    };
    use bucketlist_core::StoreConfig;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn process_session_starts_locked() {
        let status = gate_status();
        assert!(!status.unlocked);
    }

    #[test]
    fn locked_session_refuses_place_calls() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(StoreConfig::new(dir.path()));

        let list = list_in(&session);
        assert!(!list.ok);
        assert!(list.items.is_empty());
        assert!(list.message.contains("locked"));

        let add = add_in(&mut session, 1.0, 2.0);
        assert!(!add.ok);
        assert!(add.place_id.is_none());
    }

    #[test]
    fn unavailable_biometrics_reports_error_and_stays_locked() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(StoreConfig::new(dir.path()));

        let status = authenticate_in(&mut session, false, true);
        assert!(!status.unlocked);
        assert!(status.showing_auth_error);
        assert!(!status.auth_error_message.is_empty());
    }

    #[test]
    fn unlocked_session_adds_lists_and_updates_places() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = open_session(StoreConfig::new(dir.path()));

        let denied = authenticate_in(&mut session, true, false);
        assert!(!denied.unlocked);
        assert!(denied.auth_error_message.is_empty());
        assert!(authenticate_in(&mut session, true, true).unlocked);

        let added = add_in(&mut session, 56.0, -3.0);
        assert!(added.ok, "{}", added.message);
        let place_id = added.place_id.expect("add returns place id");

        let edited = PlaceItem {
            id: place_id.clone(),
            name: "Forth Bridge".to_string(),
            description: "Red cantilever".to_string(),
            latitude: 56.0,
            longitude: -3.39,
        };
        let updated = update_in(&mut session, Some(place_id.clone()), edited.clone());
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.outcome, "replaced");

        let list = list_in(&session);
        assert_eq!(list.items, vec![edited.clone()]);

        let unselected = update_in(&mut session, None, edited.clone());
        assert_eq!(unselected.outcome, "no_selection");

        let stale_id = uuid::Uuid::new_v4().to_string();
        let stale = update_in(&mut session, Some(stale_id), edited);
        assert_eq!(stale.outcome, "stale_selection");
        assert_eq!(list_in(&session).items.len(), 1);

        let invalid = update_in(&mut session, Some("nope".to_string()), list.items[0].clone());
        assert!(!invalid.ok);

        let mut reopened = open_session(StoreConfig::new(dir.path()));
        let locked = list_in(&reopened);
        assert!(!locked.ok);
        assert!(locked.items.is_empty());

        assert!(authenticate_in(&mut reopened, true, true).unlocked);
        let persisted = list_in(&reopened);
        assert_eq!(persisted.items.len(), 1);
        assert_eq!(persisted.items[0].name, "Forth Bridge");
    }
}
