//! Roster persistence.
//!
//! The registry never touches storage itself. The binary loads a roster
//! before enrolling it and saves `RegistryHandle::members()` on exit.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use lecture_core::ParticipantRecord;

/// Storage backend for a lecture roster.
pub trait RosterStore {
    /// Persists the full roster, replacing anything stored before.
    fn save(&self, records: &[ParticipantRecord]) -> Result<(), StoreError>;

    /// Loads the stored roster. An absent roster is empty, not an error.
    fn load(&self) -> Result<Vec<ParticipantRecord>, StoreError>;
}

/// Roster stored as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, error: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            error: error.to_string(),
        }
    }
}

impl RosterStore for JsonFileStore {
    fn save(&self, records: &[ParticipantRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        // Write then rename so readers never see a half-written roster
        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        info!(path = %self.path.display(), count = records.len(), "Roster saved");
        Ok(())
    }

    fn load(&self) -> Result<Vec<ParticipantRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No roster file, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let records: Vec<ParticipantRecord> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        info!(path = %self.path.display(), count = records.len(), "Roster loaded");
        Ok(records)
    }
}

/// Errors from roster storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Roster I/O error at {}: {error}", path.display())]
    Io { path: PathBuf, error: String },

    #[error("Roster serialization error: {0}")]
    Serialize(String),
}
