use std::fmt;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::domain::{DomainError, SettingValue, SettingsDocument};
use crate::ports::SettingsStore;

/// Turns a document into the bytes of a settings file.
type DocumentWriter = fn(&SettingsDocument, &mut dyn Write) -> io::Result<()>;

fn write_document(document: &SettingsDocument, writer: &mut dyn Write) -> io::Result<()> {
    document.write_pretty(writer)
}

/// JSON-file settings store.
///
/// Every file operation runs under one readers-writer lock. Clones of a store
/// share that lock, so all handles to the same settings file serialize
/// against each other. Writes are staged in a temporary file next to the
/// target and renamed over it only once fully written.
#[derive(Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
    serialize: DocumentWriter,
}

impl fmt::Debug for JsonSettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl JsonSettingsStore {
    /// Create a store for `path` with its own lock.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_lock(path, Arc::new(RwLock::new(())))
    }

    /// Create a store for `path` guarded by an existing lock.
    pub fn with_lock(path: impl Into<PathBuf>, lock: Arc<RwLock<()>>) -> Self {
        Self {
            path: path.into(),
            lock,
            serialize: write_document,
        }
    }

    /// Replace the document serializer, keeping path and lock.
    #[cfg(test)]
    pub(crate) fn with_serializer(mut self, serialize: DocumentWriter) -> Self {
        self.serialize = serialize;
        self
    }

    /// The lock guarding the settings file.
    pub fn lock(&self) -> &Arc<RwLock<()>> {
        &self.lock
    }

    /// Read and parse the settings file. Caller holds the lock.
    fn load_document(&self) -> Result<SettingsDocument, DomainError> {
        let mut file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::SettingsNotFound {
                path: self.path.clone(),
            },
            _ => DomainError::SettingsOpen {
                path: self.path.clone(),
                reason: e.to_string(),
            },
        })?;

        let mut text = String::new();
        file.read_to_string(&mut text).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => DomainError::SettingsParse {
                path: self.path.clone(),
                reason: e.to_string(),
            },
            _ => DomainError::SettingsOpen {
                path: self.path.clone(),
                reason: e.to_string(),
            },
        })?;

        SettingsDocument::parse(&text, &self.path)
    }

    /// Serialize `document` and commit it over the settings file. Caller
    /// holds the exclusive lock.
    fn write_settings(&self, document: &SettingsDocument) -> Result<(), DomainError> {
        let serialize = self.serialize;
        self.commit_with(|w| serialize(document, w))
    }

    /// Stage whatever `write` produces and rename it over the settings file.
    ///
    /// If `write` fails the staging file is discarded and the settings file
    /// keeps its previous contents.
    fn commit_with<F>(&self, write: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let write_err = |e: io::Error| DomainError::SettingsWrite {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        let staged = self.stage(write).map_err(write_err)?;

        // Keep the permissions of the file being replaced.
        if let Ok(meta) = fs::metadata(&self.path) {
            if let Err(e) = staged.as_file().set_permissions(meta.permissions()) {
                warn!(path = ?self.path, error = %e, "Failed to carry over settings file permissions");
            }
        }

        staged.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn stage<F>(&self, write: F) -> io::Result<NamedTempFile>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut staged = tempfile::Builder::new()
            .prefix(".settings-")
            .suffix(".tmp")
            .tempfile_in(self.staging_dir())?;
        write(&mut staged as &mut dyn Write)?;
        staged.as_file().sync_all()?;
        Ok(staged)
    }

    /// Staging files live next to the target so the final rename stays on
    /// one filesystem.
    fn staging_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Write `defaults` to a new settings file. Returns false when another
    /// process created the file first.
    fn create(&self, defaults: &SettingsDocument) -> Result<bool, DomainError> {
        let create_err = |e: io::Error| DomainError::SettingsCreate {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(self.staging_dir()).map_err(create_err)?;

        let serialize = self.serialize;
        let staged = self
            .stage(|w| serialize(defaults, w))
            .map_err(create_err)?;

        match staged.persist_noclobber(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(create_err(e.error)),
        }
    }

    fn log_failure(&self, err: &DomainError, key: Option<&str>) {
        let key = key.unwrap_or_default();
        match err {
            DomainError::SettingsEmpty { .. } => {
                warn!(path = ?self.path, key, "Settings file is empty");
            }
            DomainError::KeyNotRecognized { .. } => {
                error!(path = ?self.path, key, "Key does not exist in settings");
            }
            _ => {
                error!(path = ?self.path, key, error = %err, "Settings operation failed");
            }
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn settings_path(&self) -> &Path {
        &self.path
    }

    fn initialize(&self, defaults: &SettingsDocument) -> Result<(), DomainError> {
        if self.path.exists() {
            debug!(path = ?self.path, "Settings file already exists");
            return Ok(());
        }

        let _guard = self.lock.write();
        if self.path.exists() {
            debug!(path = ?self.path, "Settings file created concurrently");
            return Ok(());
        }

        match self.create(defaults) {
            Ok(true) => {
                info!(path = ?self.path, keys = defaults.keys().count(), "Settings file created");
                Ok(())
            }
            Ok(false) => {
                info!(path = ?self.path, "Settings file created by another process");
                Ok(())
            }
            Err(e) => {
                error!(path = ?self.path, error = %e, "Failed to create settings file");
                Err(e)
            }
        }
    }

    fn read_settings(&self) -> Result<SettingsDocument, DomainError> {
        let result = {
            let _guard = self.lock.read();
            self.load_document()
        };
        if let Err(e) = &result {
            self.log_failure(e, None);
        }
        result
    }

    fn try_get(&self, key: &str) -> Result<SettingValue, DomainError> {
        let result = {
            let _guard = self.lock.read();
            self.load_document()
        }
        .and_then(|document| {
            document
                .get(key)
                .cloned()
                .ok_or_else(|| DomainError::KeyNotRecognized {
                    key: key.to_string(),
                    path: self.path.clone(),
                })
        });

        if let Err(e) = &result {
            self.log_failure(e, Some(key));
        }
        result
    }

    fn try_set(&self, key: &str, value: SettingValue) -> Result<(), DomainError> {
        // One exclusive section for the whole read-modify-write so that
        // concurrent updates of different keys never overwrite each other.
        let result = {
            let _guard = self.lock.write();
            self.load_document().and_then(|mut document| {
                document.replace(key, value, &self.path)?;
                self.write_settings(&document)
            })
        };

        match &result {
            Ok(()) => debug!(path = ?self.path, key, "Setting updated"),
            Err(e) => self.log_failure(e, Some(key)),
        }
        result
    }
}
