//! Document store abstraction.
//!
//! Both documents are read and written as whole snapshots. The engine and
//! service receive a [`DocumentStore`] instead of reaching for shared
//! global state.

use chrono::Utc;
use kaul_persist::{JsonStore, PersistError};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::seed;
use crate::types::{SubjectsDocument, UsersDocument};

/// File stem of the subjects document.
pub const SUBJECTS_DOCUMENT: &str = "subjects";

/// File stem of the users document.
pub const USERS_DOCUMENT: &str = "users";

/// Whole-document access to the subjects and users documents.
pub trait DocumentStore: fmt::Debug + Send + Sync {
    /// Read the subjects document.
    fn load_subjects(&self) -> Result<SubjectsDocument>;

    /// Replace the subjects document.
    fn save_subjects(&self, doc: &SubjectsDocument) -> Result<()>;

    /// Read the users document.
    fn load_users(&self) -> Result<UsersDocument>;

    /// Replace the users document.
    fn save_users(&self, doc: &UsersDocument) -> Result<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn load_subjects(&self) -> Result<SubjectsDocument> {
        (**self).load_subjects()
    }

    fn save_subjects(&self, doc: &SubjectsDocument) -> Result<()> {
        (**self).save_subjects(doc)
    }

    fn load_users(&self) -> Result<UsersDocument> {
        (**self).load_users()
    }

    fn save_users(&self, doc: &UsersDocument) -> Result<()> {
        (**self).save_users(doc)
    }
}

/// Overwrite both documents with the seed data.
///
/// # Errors
///
/// Returns an error if either write fails.
pub fn reset(store: &dyn DocumentStore) -> Result<()> {
    store.save_subjects(&seed::default_subjects(Utc::now()))?;
    store.save_users(&seed::default_users())?;
    info!("documents reset to seed data");
    Ok(())
}

/// Documents stored as `subjects.json` and `users.json` in one directory.
///
/// A document missing on first load is created from the seed data.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    subjects: JsonStore,
    users: JsonStore,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            subjects: JsonStore::new(dir, SUBJECTS_DOCUMENT),
            users: JsonStore::new(dir, USERS_DOCUMENT),
        }
    }

    /// Path of the subjects document.
    pub fn subjects_path(&self) -> &Path {
        self.subjects.path()
    }

    /// Path of the users document.
    pub fn users_path(&self) -> &Path {
        self.users.path()
    }
}

impl DocumentStore for JsonFileStore {
    fn load_subjects(&self) -> Result<SubjectsDocument> {
        if let Some(doc) = self.subjects.read()? {
            return Ok(doc);
        }
        let doc = seed::default_subjects(Utc::now());
        self.subjects.save(&doc)?;
        info!(path = %self.subjects.path().display(), "seeded subjects document");
        Ok(doc)
    }

    fn save_subjects(&self, doc: &SubjectsDocument) -> Result<()> {
        Ok(self.subjects.save(doc)?)
    }

    fn load_users(&self) -> Result<UsersDocument> {
        if let Some(doc) = self.users.read()? {
            return Ok(doc);
        }
        let doc = seed::default_users();
        self.users.save(&doc)?;
        info!(path = %self.users.path().display(), "seeded users document");
        Ok(doc)
    }

    fn save_users(&self, doc: &UsersDocument) -> Result<()> {
        Ok(self.users.save(doc)?)
    }
}

/// In-memory documents, for tests and embedding.
///
/// Writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subjects: Mutex<SubjectsDocument>,
    users: Mutex<UsersDocument>,
    fail_subject_writes: AtomicBool,
    fail_user_writes: AtomicBool,
    subject_writes: AtomicUsize,
    user_writes: AtomicUsize,
}

impl MemoryStore {
    /// Create a store holding the given documents.
    #[must_use]
    pub fn new(subjects: SubjectsDocument, users: UsersDocument) -> Self {
        Self {
            subjects: Mutex::new(subjects),
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    /// Create a store holding the seed data.
    #[must_use]
    pub fn seeded() -> Self {
        Self::new(seed::default_subjects(Utc::now()), seed::default_users())
    }

    /// Make subsequent subjects writes fail (or succeed again).
    pub fn fail_subject_writes(&self, fail: bool) {
        self.fail_subject_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent users writes fail (or succeed again).
    pub fn fail_user_writes(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful subjects writes.
    pub fn subject_writes(&self) -> usize {
        self.subject_writes.load(Ordering::SeqCst)
    }

    /// Number of successful users writes.
    pub fn user_writes(&self) -> usize {
        self.user_writes.load(Ordering::SeqCst)
    }

    fn write_failure(name: &str) -> PersistError {
        PersistError::Io {
            path: format!("memory/{name}.json").into(),
            source: io::Error::other("write rejected"),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load_subjects(&self) -> Result<SubjectsDocument> {
        Ok(self.subjects.lock().clone())
    }

    fn save_subjects(&self, doc: &SubjectsDocument) -> Result<()> {
        if self.fail_subject_writes.load(Ordering::SeqCst) {
            return Err(Self::write_failure(SUBJECTS_DOCUMENT).into());
        }
        *self.subjects.lock() = doc.clone();
        self.subject_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_users(&self) -> Result<UsersDocument> {
        Ok(self.users.lock().clone())
    }

    fn save_users(&self, doc: &UsersDocument) -> Result<()> {
        if self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(Self::write_failure(USERS_DOCUMENT).into());
        }
        *self.users.lock() = doc.clone();
        self.user_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
