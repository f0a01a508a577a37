//! Location repository contracts, JSON codec and storage implementations.
//!
//! # Responsibility
//! - Read and write the whole place collection as one unit.
//! - Keep file-system and encoding details inside the persistence boundary.
//!
//! # Invariants
//! - File writes are atomic: the target holds either the previous complete
//!   content or the new complete content, never a mixture.
//! - Decoded collections never contain two records with the same id.
//! - Record order in the file is the collection order.

use crate::model::location::{Location, LocationId};
use log::{debug, error};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tempfile::NamedTempFile;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for place collection reads and writes.
#[derive(Debug)]
pub enum RepoError {
    /// No stored collection exists yet.
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    /// Stored content repeats an id.
    DuplicateId(LocationId),
    /// JSON has no representation for NaN or infinite coordinates.
    NonFiniteCoordinate(LocationId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "no saved places at `{}`", path.display()),
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::Decode(err) => write!(f, "saved places are malformed: {err}"),
            Self::Encode(err) => write!(f, "places could not be encoded: {err}"),
            Self::DuplicateId(id) => write!(f, "saved places repeat id {id}"),
            Self::NonFiniteCoordinate(id) => {
                write!(f, "place {id} has a non-finite coordinate")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) | Self::NonFiniteCoordinate(_) => None,
        }
    }
}

impl RepoError {
    /// Stable short code used in structured log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Io { .. } => "io",
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::DuplicateId(_) => "duplicate_id",
            Self::NonFiniteCoordinate(_) => "non_finite_coordinate",
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Durable storage contract for the whole place collection.
pub trait LocationRepository {
    fn load_all(&self) -> RepoResult<Vec<Location>>;
    fn save_all(&self, locations: &[Location]) -> RepoResult<()>;
}

/// Encodes the collection as a JSON array of records.
///
/// Rejects non-finite coordinates: serde_json would write them as `null`,
/// which no later load can read back.
pub fn encode_locations(locations: &[Location]) -> RepoResult<Vec<u8>> {
    if let Some(location) = locations
        .iter()
        .find(|location| !location.latitude.is_finite() || !location.longitude.is_finite())
    {
        return Err(RepoError::NonFiniteCoordinate(location.id));
    }
    serde_json::to_vec(locations).map_err(RepoError::Encode)
}

/// Decodes a JSON array of records, rejecting repeated ids.
pub fn decode_locations(bytes: &[u8]) -> RepoResult<Vec<Location>> {
    let locations: Vec<Location> = serde_json::from_slice(bytes).map_err(RepoError::Decode)?;
    let mut seen = HashSet::with_capacity(locations.len());
    for location in &locations {
        if !seen.insert(location.id) {
            return Err(RepoError::DuplicateId(location.id));
        }
    }
    Ok(locations)
}

/// JSON file repository with write-to-temp-then-rename persistence.
#[derive(Debug, Clone)]
pub struct JsonFileLocationRepository {
    path: PathBuf,
}

impl JsonFileLocationRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the encoded collection into a synced temp file next to the
    /// target without touching the target itself.
    ///
    /// Dropping the returned [`StagedWrite`] discards the temp file.
    ///
    /// # Errors
    /// - `NonFiniteCoordinate` or `Encode` when a record cannot be
    ///   represented as JSON.
    /// - `Io` when the directory or temp file cannot be created or written.
    pub fn stage(&self, locations: &[Location]) -> RepoResult<StagedWrite> {
        let bytes = encode_locations(locations)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| RepoError::io(&dir, err))?;

        // NamedTempFile is created 0600 on unix and keeps that mode after rename.
        let mut temp = NamedTempFile::new_in(&dir).map_err(|err| RepoError::io(&dir, err))?;
        temp.write_all(&bytes)
            .map_err(|err| RepoError::io(temp.path(), err))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| RepoError::io(temp.path(), err))?;

        Ok(StagedWrite {
            temp,
            target: self.path.clone(),
            dir,
            bytes: bytes.len(),
        })
    }
}

impl LocationRepository for JsonFileLocationRepository {
    fn load_all(&self) -> RepoResult<Vec<Location>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RepoError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(RepoError::io(&self.path, err)),
        };
        decode_locations(&bytes)
    }

    fn save_all(&self, locations: &[Location]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.stage(locations).and_then(StagedWrite::commit);
        match &result {
            Ok(()) => debug!(
                "event=places_write module=repo status=ok count={} duration_ms={}",
                locations.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=places_write module=repo status=error count={} duration_ms={} error_code={}",
                locations.len(),
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }
}

/// Fully written temp file waiting to replace the target.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
    dir: PathBuf,
    bytes: usize,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    /// Atomically renames the temp file over the target.
    pub fn commit(self) -> RepoResult<()> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|err| RepoError::io(&target, err.error))?;
        #[cfg(unix)]
        {
            if let Ok(dir) = fs::File::open(&self.dir) {
                let _ = dir.sync_all();
            }
        }
        #[cfg(not(unix))]
        let _ = self.dir;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    bytes: Option<Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

/// Byte-buffer repository using the same codec as the file repository.
///
/// Clones share one buffer, so a test can keep a handle while a store owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocationRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryLocationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with raw stored content, valid or not.
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let repo = Self::default();
        repo.lock().bytes = Some(bytes.into());
        repo
    }

    /// Makes every following write fail with an i/o error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Current stored content.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.lock().bytes.clone()
    }

    /// Number of write attempts, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

const MEMORY_PATH: &str = ":memory:";

impl LocationRepository for InMemoryLocationRepository {
    fn load_all(&self) -> RepoResult<Vec<Location>> {
        match self.lock().bytes.as_deref() {
            Some(bytes) => decode_locations(bytes),
            None => Err(RepoError::NotFound(PathBuf::from(MEMORY_PATH))),
        }
    }

    fn save_all(&self, locations: &[Location]) -> RepoResult<()> {
        let mut state = self.lock();
        state.writes += 1;
        if state.fail_writes {
            return Err(RepoError::io(
                Path::new(MEMORY_PATH),
                io::Error::other("writes disabled"),
            ));
        }
        let bytes = encode_locations(locations)?;
        state.bytes = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_locations, encode_locations, InMemoryLocationRepository, RepoError};
    use crate::model::location::{Coordinate, Location, LocationId};
    use crate::repo::location_repo::LocationRepository;

    #[test]
    fn decode_rejects_repeated_ids() {
        let id = LocationId::new_v4();
        let first = Location::with_id(id, "a", "", Coordinate::new(1.0, 1.0));
        let second = Location::with_id(id, "b", "", Coordinate::new(2.0, 2.0));
        let bytes = encode_locations(&[first, second]).expect("encode");

        let err = decode_locations(&bytes).expect_err("repeated ids must fail");
        assert!(matches!(err, RepoError::DuplicateId(value) if value == id));
    }

    #[test]
    fn decode_rejects_non_array_content() {
        let err = decode_locations(br#"{"id":"x"}"#).expect_err("object is not a collection");
        assert_eq!(err.code(), "decode");
    }

    #[test]
    fn encode_rejects_non_finite_coordinates() {
        for coordinate in [
            Coordinate::new(f64::NAN, 0.0),
            Coordinate::new(0.0, f64::INFINITY),
            Coordinate::new(f64::NEG_INFINITY, 1.0),
        ] {
            let location = Location::new(coordinate);
            let err = encode_locations(&[location.clone()]).expect_err("non-finite must fail");
            assert!(matches!(err, RepoError::NonFiniteCoordinate(id) if id == location.id));
            assert_eq!(err.code(), "non_finite_coordinate");
        }
    }

    #[test]
    fn memory_repo_reports_missing_content_as_not_found() {
        let repo = InMemoryLocationRepository::new();
        let err = repo.load_all().expect_err("empty repo has nothing to load");
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[test]
    fn memory_repo_counts_failed_writes_and_keeps_previous_bytes() {
        let repo = InMemoryLocationRepository::new();
        repo.save_all(&[Location::new(Coordinate::new(3.0, 4.0))])
            .expect("first write");
        let before = repo.bytes();

        repo.set_fail_writes(true);
        let err = repo.save_all(&[]).expect_err("write must fail");
        assert_eq!(err.code(), "io");
        assert_eq!(repo.bytes(), before);
        assert_eq!(repo.write_attempts(), 2);
    }
}
