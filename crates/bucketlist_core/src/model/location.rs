//! Location domain model.
//!
//! # Responsibility
//! - Define the canonical point-of-interest record kept by the store.
//! - Provide constructors that apply creation defaults.
//!
//! # Invariants
//! - `id` is assigned at creation and never changes afterwards.
//! - Equality is identity equality: two records are equal iff their ids match.
//! - Coordinates hold the last value supplied; no history is kept.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one stored place.
pub type LocationId = Uuid;

/// Name given to freshly created places until the user edits them.
pub const DEFAULT_LOCATION_NAME: &str = "New location";

/// Geographic point in degrees.
///
/// No range validation is applied; callers supply whatever the map reports.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One point-of-interest entry.
///
/// Serialized field names are part of the persisted file format and must not
/// change: `id`, `name`, `description`, `latitude`, `longitude`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Creates a new place at `coordinate` with a generated id.
    ///
    /// # Invariants
    /// - `name` starts as [`DEFAULT_LOCATION_NAME`].
    /// - `description` starts empty.
    pub fn new(coordinate: Coordinate) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            DEFAULT_LOCATION_NAME,
            String::new(),
            coordinate,
        )
    }

    /// Creates a place with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: LocationId,
        name: impl Into<String>,
        description: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = coordinate.latitude;
        self.longitude = coordinate.longitude;
    }

    /// Field-by-field comparison, unlike `==` which only compares ids.
    pub fn same_content(&self, other: &Location) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Location {}

#[cfg(test)]
mod tests {
    use super::{Coordinate, Location, DEFAULT_LOCATION_NAME};

    #[test]
    fn new_location_applies_creation_defaults() {
        let location = Location::new(Coordinate::new(56.0, -3.0));
        assert_eq!(location.name, DEFAULT_LOCATION_NAME);
        assert!(location.description.is_empty());
        assert_eq!(location.coordinate(), Coordinate::new(56.0, -3.0));
    }

    #[test]
    fn equality_only_considers_identity() {
        let original = Location::new(Coordinate::new(1.0, 2.0));
        let mut renamed = original.clone();
        renamed.name = "Edinburgh Castle".to_string();
        renamed.set_coordinate(Coordinate::new(55.9486, -3.1999));

        assert_eq!(original, renamed);
        assert!(!original.same_content(&renamed));
    }

    #[test]
    fn serialized_shape_uses_stable_field_names() {
        let location = Location::new(Coordinate::new(10.5, -20.25));
        let value = serde_json::to_value(&location).expect("serialize location");
        let object = value.as_object().expect("location serializes as object");

        let mut keys = object.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(
            keys,
            vec!["description", "id", "latitude", "longitude", "name"]
        );
        assert_eq!(object["latitude"], 10.5);
        assert_eq!(object["id"], location.id.to_string());
    }

    #[test]
    fn accepts_uppercase_identifiers_on_read() {
        let raw = r#"{
            "id": "6F9619FF-8B86-D011-B42D-00C04FC964FF",
            "name": "Old Town",
            "description": "",
            "latitude": 55.95,
            "longitude": -3.19
        }"#;
        let location: Location = serde_json::from_str(raw).expect("decode uppercase uuid");
        assert_eq!(
            location.id.to_string(),
            "6f9619ff-8b86-d011-b42d-00c04fc964ff"
        );
    }
}
