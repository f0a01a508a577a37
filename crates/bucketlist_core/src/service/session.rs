//! Gated place session.
//!
//! Composes the access gate with the place store the way a presentation
//! layer drives them: authenticate first, then read and edit places. Also
//! tracks the currently selected place for hosts that do not keep it.

use crate::auth::gate::{AccessGate, AccessState};
use crate::auth::verifier::BiometricVerifier;
use crate::model::location::{Coordinate, Location, LocationId};
use crate::repo::location_repo::LocationRepository;
use crate::service::location_store::{LocationStore, UpdateOutcome};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The gate has not been unlocked yet.
    Locked,
    /// `select` named an id that is not stored.
    UnknownLocation(LocationId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "places are locked; authenticate first"),
            Self::UnknownLocation(id) => write!(f, "place not found: {id}"),
        }
    }
}

impl Error for SessionError {}

pub struct PlacesSession<R: LocationRepository, V: BiometricVerifier> {
    gate: AccessGate<V>,
    store: LocationStore<R>,
    selected: Option<Location>,
}

impl<R: LocationRepository, V: BiometricVerifier> PlacesSession<R, V> {
    /// Opens the store and starts with a locked gate.
    pub fn new(repo: R, verifier: V) -> Self {
        Self {
            gate: AccessGate::new(verifier),
            store: LocationStore::open(repo),
            selected: None,
        }
    }

    pub async fn authenticate(&mut self) -> AccessState {
        self.gate.authenticate().await
    }

    pub fn gate(&self) -> &AccessGate<V> {
        &self.gate
    }

    /// Hides the authentication error alert.
    pub fn dismiss_auth_error(&mut self) {
        self.gate.dismiss_auth_error();
    }

    pub fn locations(&self) -> SessionResult<&[Location]> {
        self.ensure_unlocked()?;
        Ok(self.store.locations())
    }

    pub fn add(&mut self, coordinate: Coordinate) -> SessionResult<LocationId> {
        self.ensure_unlocked()?;
        Ok(self.store.add(coordinate))
    }

    /// Updates with an explicit selection supplied by the host.
    pub fn update(
        &mut self,
        selected: Option<&Location>,
        edited: Location,
    ) -> SessionResult<UpdateOutcome> {
        self.ensure_unlocked()?;
        Ok(self.store.update(selected, edited))
    }

    /// Remembers the stored place with `id` as the current selection.
    pub fn select(&mut self, id: LocationId) -> SessionResult<&Location> {
        self.ensure_unlocked()?;
        let location = self
            .store
            .get(id)
            .cloned()
            .ok_or(SessionError::UnknownLocation(id))?;
        let selected: &Location = self.selected.insert(location);
        Ok(selected)
    }

    pub fn selected(&self) -> Option<&Location> {
        self.selected.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Applies `edited` to the tracked selection and then clears it.
    pub fn update_selected(&mut self, edited: Location) -> SessionResult<UpdateOutcome> {
        self.ensure_unlocked()?;
        let selected = self.selected.take();
        Ok(self.store.update(selected.as_ref(), edited))
    }

    pub fn store(&self) -> SessionResult<&LocationStore<R>> {
        self.ensure_unlocked()?;
        Ok(&self.store)
    }

    fn ensure_unlocked(&self) -> SessionResult<()> {
        if self.gate.is_unlocked() {
            Ok(())
        } else {
            Err(SessionError::Locked)
        }
    }
}
