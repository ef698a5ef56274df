//! Locked, atomically rewritten JSON documents.
//!
//! Every durable document Vauban owns (the port registry, instance server
//! configuration) goes through [`JsonDocumentFile`]. Writes land in a
//! temporary sibling and are renamed into place, so readers never observe a
//! partially written document. Read-modify-write sequences take an exclusive
//! advisory lock on a sibling `.lock` file for the duration of the critical
//! section.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::OpenOptions;
use cap_std::fs_utf8::Dir;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::io;
use thiserror::Error;
use uuid::Uuid;

/// Result type for document storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned while reading, writing, or locking a JSON document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The document path has no file name component.
    #[error("document path {0} has no file name")]
    MissingFileName(Utf8PathBuf),

    /// Filesystem access failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document is not valid JSON for the expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path being parsed.
        path: Utf8PathBuf,
        /// Underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be encoded.
    #[error("failed to encode document for {path}: {source}")]
    Encode {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying encoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The exclusive lock could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: Utf8PathBuf,
        /// Underlying locking error.
        #[source]
        source: io::Error,
    },
}

/// Scoped exclusive access to a shared document.
///
/// The lock is released when the lease is dropped. Stores without
/// cross-process state hand out unguarded leases.
pub struct DocumentLease {
    guard: Option<Box<dyn Send>>,
}

impl DocumentLease {
    /// Creates a lease that holds no lock.
    #[must_use]
    pub fn unguarded() -> Self {
        Self { guard: None }
    }

    /// Creates a lease that releases `guard` when dropped.
    #[must_use]
    pub fn guarded(guard: impl Send + 'static) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// Returns whether this lease holds a lock.
    #[must_use]
    pub const fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }
}

impl fmt::Debug for DocumentLease {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DocumentLease")
            .field("guarded", &self.is_guarded())
            .finish()
    }
}

/// A JSON document stored at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDocumentFile {
    path: Utf8PathBuf,
}

impl JsonDocumentFile {
    /// Creates a handle for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reads and decodes the document.
    ///
    /// Returns `Ok(None)` when the document or its directory does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the file cannot be read or decoded.
    pub fn read<T: DeserializeOwned>(&self) -> StorageResult<Option<T>> {
        let (parent, file_name) = self.split()?;
        let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let contents = match dir.read_to_string(file_name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Encodes and atomically replaces the document, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when encoding, writing, or renaming fails.
    pub fn write<T: Serialize>(&self, value: &T) -> StorageResult<()> {
        let mut encoded =
            serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
                path: self.path.clone(),
                source,
            })?;
        encoded.push('\n');

        let (dir, file_name) = self.open_parent_creating()?;
        let temp_name = format!(".{file_name}.{}.tmp", Uuid::new_v4().simple());
        if let Err(err) = dir.write(&temp_name, encoded.as_bytes()) {
            return Err(self.io_error(err));
        }
        if let Err(err) = dir.rename(&temp_name, &dir, file_name) {
            if let Err(cleanup) = dir.remove_file(&temp_name) {
                tracing::debug!(path = %self.path, error = %cleanup, "temporary document left behind");
            }
            return Err(self.io_error(err));
        }
        Ok(())
    }

    /// Writes `value` only when the document does not exist yet.
    ///
    /// Returns whether the document was created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the existence check or write fails.
    pub fn create_if_missing<T: Serialize>(&self, value: &T) -> StorageResult<bool> {
        let (dir, file_name) = self.open_parent_creating()?;
        match dir.try_exists(file_name) {
            Ok(true) => Ok(false),
            Ok(false) => self.write(value).map(|()| true),
            Err(err) => Err(self.io_error(err)),
        }
    }

    /// Takes an exclusive advisory lock on the document's `.lock` sibling.
    ///
    /// Blocks until the lock is available. On platforms without advisory
    /// locks the lease only keeps the lock file open.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the lock file cannot be opened or
    /// locked.
    pub fn lock_exclusive(&self) -> StorageResult<DocumentLease> {
        let (dir, file_name) = self.open_parent_creating()?;
        let lock_name = format!("{file_name}.lock");
        let lock_path = self.path.with_file_name(&lock_name);
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        let file = dir
            .open_with(&lock_name, &options)
            .map_err(|source| StorageError::Lock {
                path: lock_path.clone(),
                source,
            })?
            .into_std();
        lock_file(file).map_err(|source| StorageError::Lock {
            path: lock_path,
            source,
        })
    }

    fn split(&self) -> StorageResult<(&Utf8Path, &str)> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| StorageError::MissingFileName(self.path.clone()))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        Ok((parent, file_name))
    }

    fn open_parent_creating(&self) -> StorageResult<(Dir, &str)> {
        let (parent, file_name) = self.split()?;
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| self.io_error(err))?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| self.io_error(err))?;
        Ok((dir, file_name))
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn lock_file(file: std::fs::File) -> io::Result<DocumentLease> {
    use nix::fcntl::{Flock, FlockArg};

    Flock::lock(file, FlockArg::LockExclusive)
        .map(DocumentLease::guarded)
        .map_err(|(_, errno)| io::Error::from(errno))
}

#[cfg(not(unix))]
fn lock_file(file: std::fs::File) -> io::Result<DocumentLease> {
    Ok(DocumentLease::guarded(file))
}
