//! JSON file-backed persistence for Kaul documents.
//!
//! A [`JsonStore`] owns one `<name>.json` file inside a state directory and
//! reads or writes it as a whole-document snapshot. Writes go to a sibling
//! temporary file which is then renamed over the target, so readers never
//! observe a half-written document.

#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a valid document.
    #[error("corrupt document {path}: {source}")]
    Corrupt {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be encoded.
    #[error("failed to encode document {name}: {source}")]
    Encode {
        /// Document name.
        name: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;

/// A single JSON document stored at `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    name: String,
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for `<dir>/<name>.json`. Nothing is touched on disk.
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: dir.join(format!("{name}.json")),
        }
    }

    /// Full path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. Returns `Ok(None)` when the file does not exist.
    pub fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(store = %self.name, "no snapshot on disk");
                return Ok(None);
            }
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| PersistError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Write the document, replacing any previous snapshot.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Encode {
            name: self.name.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &encoded).map_err(|source| PersistError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(store = %self.name, bytes = encoded.len(), "snapshot written");
        Ok(())
    }
}
