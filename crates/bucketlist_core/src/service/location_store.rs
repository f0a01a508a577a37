//! Place store use-case service.
//!
//! # Responsibility
//! - Own the authoritative in-memory place collection.
//! - Keep the durable copy consistent by rewriting it after every mutation.
//! - Absorb load and save failures so callers always see the in-memory truth.
//!
//! # Invariants
//! - Collection order is insertion order; updates keep position.
//! - Ids are unique within the collection and never change.
//! - `load` and `save` never return errors to the caller; failures are logged,
//!   recorded and published as events.

use crate::model::location::{Coordinate, Location, LocationId};
use crate::repo::location_repo::{LocationRepository, RepoError};
use log::{error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The selected record was replaced in place.
    Replaced,
    /// A selection was given but no stored record has its id.
    StaleSelection,
    /// No selection was given; nothing happened.
    NoSelection,
}

impl UpdateOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replaced => "replaced",
            Self::StaleSelection => "stale_selection",
            Self::NoSelection => "no_selection",
        }
    }
}

/// Informational result of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed,
}

/// Change notification delivered to store subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded { count: usize },
    Added(LocationId),
    Updated { id: LocationId, outcome: UpdateOutcome },
    Saved { count: usize },
    SaveFailed { message: String },
}

type Listener = Box<dyn FnMut(&StoreEvent) + Send>;

/// In-memory place collection backed by a whole-collection repository.
pub struct LocationStore<R: LocationRepository> {
    repo: R,
    locations: Vec<Location>,
    listeners: Vec<Listener>,
    last_save_error: Option<RepoError>,
    save_attempts: u64,
    save_failures: u64,
}

impl<R: LocationRepository> LocationStore<R> {
    /// Creates a store and loads whatever the repository holds.
    ///
    /// Missing or unreadable content yields an empty store.
    pub fn open(repo: R) -> Self {
        let mut store = Self {
            repo,
            locations: Vec::new(),
            listeners: Vec::new(),
            last_save_error: None,
            save_attempts: 0,
            save_failures: 0,
        };
        store.load();
        store
    }

    /// Replaces the collection with the repository content.
    ///
    /// Any failure resets the collection to empty.
    pub fn load(&mut self) {
        self.locations = match self.repo.load_all() {
            Ok(locations) => {
                info!(
                    "event=places_load module=store status=ok count={}",
                    locations.len()
                );
                locations
            }
            Err(RepoError::NotFound(_)) => {
                info!("event=places_load module=store status=empty reason=not_found");
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=places_load module=store status=recovered error_code={} error={}",
                    err.code(),
                    err
                );
                Vec::new()
            }
        };
        let count = self.locations.len();
        self.publish(&StoreEvent::Loaded { count });
    }

    /// Appends a new place at `coordinate` and persists the collection.
    ///
    /// Returns the id of the created place.
    pub fn add(&mut self, coordinate: Coordinate) -> LocationId {
        let location = Location::new(coordinate);
        let id = location.id;
        self.locations.push(location);
        self.publish(&StoreEvent::Added(id));
        self.save();
        id
    }

    /// Replaces the currently selected place with `edited`.
    ///
    /// # Contract
    /// - `selected == None` is a no-op and does not save.
    /// - The record is found by the selection's id and replaced in place.
    /// - A stale selection changes nothing but still triggers a save.
    /// - The stored id is kept even if `edited` carries a different one.
    pub fn update(&mut self, selected: Option<&Location>, edited: Location) -> UpdateOutcome {
        let Some(selected) = selected else {
            return UpdateOutcome::NoSelection;
        };

        let id = selected.id;
        let outcome = match self.locations.iter().position(|stored| stored.id == id) {
            Some(index) => {
                let mut replacement = edited;
                if replacement.id != id {
                    warn!(
                        "event=places_update module=store status=id_mismatch selected_id={} edited_id={}",
                        id, replacement.id
                    );
                    replacement.id = id;
                }
                self.locations[index] = replacement;
                UpdateOutcome::Replaced
            }
            None => {
                info!(
                    "event=places_update module=store status=stale selected_id={}",
                    id
                );
                UpdateOutcome::StaleSelection
            }
        };

        self.publish(&StoreEvent::Updated { id, outcome });
        self.save();
        outcome
    }

    /// Rewrites the whole collection through the repository.
    ///
    /// Failures are logged and recorded, never returned as errors.
    pub fn save(&mut self) -> SaveOutcome {
        self.save_attempts += 1;
        let count = self.locations.len();
        match self.repo.save_all(&self.locations) {
            Ok(()) => {
                self.last_save_error = None;
                self.publish(&StoreEvent::Saved { count });
                SaveOutcome::Saved
            }
            Err(err) => {
                self.save_failures += 1;
                error!(
                    "event=places_save module=store status=error count={} error_code={} error={}",
                    count,
                    err.code(),
                    err
                );
                let message = err.to_string();
                self.last_save_error = Some(err);
                self.publish(&StoreEvent::SaveFailed { message });
                SaveOutcome::Failed
            }
        }
    }

    /// Registers a listener called synchronously for every store event.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Places in insertion order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|location| location.id == id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Error of the most recent save, cleared by the next successful save.
    pub fn last_save_error(&self) -> Option<&RepoError> {
        self.last_save_error.as_ref()
    }

    pub fn save_attempts(&self) -> u64 {
        self.save_attempts
    }

    pub fn save_failures(&self) -> u64 {
        self.save_failures
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn publish(&mut self, event: &StoreEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

/// Store handle for hosts with more than one caller.
///
/// Every operation holds the lock for its whole read-modify-rewrite cycle.
pub struct SharedLocationStore<R: LocationRepository> {
    inner: Arc<Mutex<LocationStore<R>>>,
}

impl<R: LocationRepository> Clone for SharedLocationStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: LocationRepository> SharedLocationStore<R> {
    pub fn new(store: LocationStore<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn add(&self, coordinate: Coordinate) -> LocationId {
        self.lock().add(coordinate)
    }

    pub fn update(&self, selected: Option<&Location>, edited: Location) -> UpdateOutcome {
        self.lock().update(selected, edited)
    }

    pub fn save(&self) -> SaveOutcome {
        self.lock().save()
    }

    /// Copy of the current collection.
    pub fn snapshot(&self) -> Vec<Location> {
        self.lock().locations().to_vec()
    }

    /// Runs `f` with exclusive access to the store.
    pub fn with<T>(&self, f: impl FnOnce(&mut LocationStore<R>) -> T) -> T {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, LocationStore<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{LocationStore, SaveOutcome, StoreEvent, UpdateOutcome};
    use crate::model::location::{Coordinate, Location};
    use crate::repo::location_repo::InMemoryLocationRepository;
    use std::sync::{Arc, Mutex};

    #[test]
    fn events_follow_mutation_order() {
        let mut store = LocationStore::open(InMemoryLocationRepository::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(move |event| sink.lock().expect("event sink").push(event.clone()));

        let id = store.add(Coordinate::new(1.0, 2.0));

        let recorded = events.lock().expect("event sink").clone();
        assert_eq!(
            recorded,
            vec![StoreEvent::Added(id), StoreEvent::Saved { count: 1 }]
        );
    }

    #[test]
    fn save_failure_is_recorded_and_cleared_by_next_success() {
        let repo = InMemoryLocationRepository::new();
        let mut store = LocationStore::open(repo.clone());

        repo.set_fail_writes(true);
        store.add(Coordinate::new(0.0, 0.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.save_failures(), 1);
        assert!(store.last_save_error().is_some());

        repo.set_fail_writes(false);
        assert_eq!(store.save(), SaveOutcome::Saved);
        assert!(store.last_save_error().is_none());
        assert_eq!(store.save_attempts(), 2);
    }

    #[test]
    fn mismatched_edited_id_keeps_stored_identity() {
        let mut store = LocationStore::open(InMemoryLocationRepository::new());
        let id = store.add(Coordinate::new(5.0, 5.0));
        let selected = store.get(id).cloned().expect("added place");

        let mut edited = Location::new(Coordinate::new(6.0, 6.0));
        edited.name = "Renamed".to_string();
        let outcome = store.update(Some(&selected), edited);

        assert_eq!(outcome, UpdateOutcome::Replaced);
        assert_eq!(store.len(), 1);
        let stored = &store.locations()[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.coordinate(), Coordinate::new(6.0, 6.0));
    }
}
