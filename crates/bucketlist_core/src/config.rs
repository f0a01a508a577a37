//! Storage location configuration.
//!
//! # Invariants
//! - `data_dir` is absolute after `validate()`.
//! - `file_name` is a single non-empty path component.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// File name of the saved collection inside the data directory.
pub const DEFAULT_FILE_NAME: &str = "SavedPlaces";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BUCKETLIST_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyFileName,
    InvalidFileName(String),
    RelativeDataDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFileName => write!(f, "file name cannot be empty"),
            Self::InvalidFileName(value) => {
                write!(f, "file name must be a single path component, got `{value}`")
            }
            Self::RelativeDataDir(path) => write!(
                f,
                "data directory must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// Resolves the data directory from `BUCKETLIST_DATA_DIR`, falling back
    /// to the OS temp directory when unset or blank.
    pub fn from_env() -> Self {
        let data_dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::new(data_dir)
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.file_name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyFileName);
        }
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(ConfigError::InvalidFileName(self.file_name.clone())),
        }
        if !self.data_dir.is_absolute() {
            return Err(ConfigError::RelativeDataDir(self.data_dir.clone()));
        }
        Ok(())
    }

    pub fn save_path(&self) -> PathBuf {
        self.data_dir.join(self.file_name.trim())
    }
}
