//! Saving designer state through an opaque key/value storage.
//!
//! The engine only needs `get` and `set` of a text blob under a fixed name.
//! Whatever sits behind the [`Storage`] trait may be missing or broken; the
//! store logs such failures and carries on.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::Schema;

/// Version of the persisted envelope, independent of the schema version.
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage name '{0}' is not a plain file name")]
    InvalidName(String),
    #[error("persisted state is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("persisted state has version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}

/// Text blobs keyed by name.
pub trait Storage {
    fn get(&self, name: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, name: &str, text: &str) -> Result<(), PersistError>;
}

/// In-process storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, name: &str) -> Result<Option<String>, PersistError> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| PersistError::Unavailable(err.to_string()))?;
        Ok(entries.get(name).cloned())
    }

    fn set(&mut self, name: &str, text: &str) -> Result<(), PersistError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| PersistError::Unavailable(err.to_string()))?;
        entries.insert(name.to_string(), text.to_string());
        Ok(())
    }
}

/// One `<name>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, PersistError> {
        let plain = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !name.starts_with('.');
        if !plain {
            return Err(PersistError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl Storage for FileStorage {
    fn get(&self, name: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Read { path, source }),
        }
    }

    fn set(&mut self, name: &str, text: &str) -> Result<(), PersistError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, text).map_err(|source| PersistError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| PersistError::Write { path, source })
    }
}

/// Stored form of the designer: `{version, state: {schema, history, selectedId}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub state: DesignerState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerState {
    pub schema: Schema,
    #[serde(default)]
    pub history: PersistedHistory,
    #[serde(default)]
    pub selected_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedHistory {
    #[serde(default)]
    pub past: Vec<Schema>,
    #[serde(default)]
    pub future: Vec<Schema>,
}

impl PersistedState {
    pub fn new(state: DesignerState) -> Self {
        Self {
            version: STATE_VERSION,
            state,
        }
    }

    pub fn encode(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an envelope and checks its version. Schemas inside are
    /// checked by the store when it adopts them.
    pub fn decode(text: &str) -> Result<Self, PersistError> {
        let persisted: PersistedState = serde_json::from_str(text)?;
        if persisted.version != STATE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: persisted.version,
                expected: STATE_VERSION,
            });
        }
        Ok(persisted)
    }
}
