//! Reading and writing the store and digest files.
//!
//! Writes are atomic: content goes to a sibling temp file, is synced, and
//! is renamed over the target. A run commits the store and the digest
//! together, so both temp files are written before either rename happens.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use tracing::{debug, warn};

use super::Store;
use crate::error::{Error, Result};
use crate::record::Digest;

/// Default store file name.
pub const STORE_FILE: &str = "store.json";

/// Default digest file name.
pub const DIGEST_FILE: &str = "top24.json";

/// Storage for the store and the digest.
pub trait Persistence {
    /// Previously saved store. Missing or unreadable data yields an empty store.
    fn load_store(&self) -> Store;

    /// Replace the saved store.
    ///
    /// # Errors
    ///
    /// Write failures are returned and must end the run.
    fn save_store(&self, store: &Store) -> Result<()>;

    /// Previously saved digest, `None` when there is none yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the digest exists but cannot be read or decoded.
    fn load_digest(&self) -> Result<Option<Digest>>;

    /// Replace the saved digest.
    ///
    /// # Errors
    ///
    /// Write failures are returned and must end the run.
    fn save_digest(&self, digest: &Digest) -> Result<()>;

    /// Save the store and the digest of one run.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    fn commit(&self, store: &Store, digest: &Digest) -> Result<()> {
        self.save_store(store)?;
        self.save_digest(digest)
    }

    /// Exclusive access for one read-merge-prune-write cycle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreLocked`] when another run holds the lock.
    fn lock(&self) -> Result<RunLock> {
        Ok(RunLock::unlocked())
    }
}

/// Held for the duration of a run.
///
/// Wraps an exclusive advisory lock on an open lock file. The lock goes away
/// with the file handle, so a crashed run never blocks the next one. The file
/// itself is left in place; removing it would let two runs lock different
/// inodes under the same name.
#[derive(Debug)]
#[must_use = "the lock is released when dropped"]
pub struct RunLock {
    file: Option<File>,
}

impl RunLock {
    /// A guard that protects nothing, for storage without a lock file.
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    /// Lock `path` exclusively, creating it if needed.
    ///
    /// # Errors
    ///
    /// [`Error::StoreLocked`] when another handle holds the lock, [`Error::Io`]
    /// for any other failure.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io(path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(Error::StoreLocked(path.to_path_buf()));
            }
            return Err(Error::io(path, e));
        }

        // Owner pid, for whoever inspects a held lock.
        file.set_len(0).map_err(|e| Error::io(path, e))?;
        writeln!(file, "{}", std::process::id()).map_err(|e| Error::io(path, e))?;
        debug!(lock = %path.display(), "acquired store lock");
        Ok(Self { file: Some(file) })
    }

    /// Whether this guard holds a real lock.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }
}

/// JSON files in a data directory.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    dir: PathBuf,
    store_file: String,
    digest_file: String,
}

impl JsonFilePersistence {
    /// `store.json` and `top24.json` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store_file: STORE_FILE.to_string(),
            digest_file: DIGEST_FILE.to_string(),
        }
    }

    /// Use different file names inside the same directory.
    #[must_use]
    pub fn with_file_names(mut self, store_file: impl Into<String>, digest_file: impl Into<String>) -> Self {
        self.store_file = store_file.into();
        self.digest_file = digest_file.into();
        self
    }

    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(&self.store_file)
    }

    #[must_use]
    pub fn digest_path(&self) -> PathBuf {
        self.dir.join(&self.digest_file)
    }

    /// `<store file>.lock` next to the store.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(format!("{}.lock", self.store_file))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))
    }
}

impl Persistence for JsonFilePersistence {
    fn load_store(&self) -> Store {
        let path = self.store_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store yet, starting empty");
                return Store::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store unreadable, starting empty");
                return Store::new();
            }
        };
        match serde_json::from_slice::<Store>(&bytes) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store corrupt, starting empty");
                Store::new()
            }
        }
    }

    fn save_store(&self, store: &Store) -> Result<()> {
        self.ensure_dir()?;
        write_atomic(&self.store_path(), store)
    }

    fn load_digest(&self) -> Result<Option<Digest>> {
        let path = self.digest_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    fn save_digest(&self, digest: &Digest) -> Result<()> {
        self.ensure_dir()?;
        write_atomic(&self.digest_path(), digest)
    }

    fn commit(&self, store: &Store, digest: &Digest) -> Result<()> {
        self.ensure_dir()?;
        let store_path = self.store_path();
        let digest_path = self.digest_path();

        let store_tmp = write_temp(&store_path, store)?;
        let digest_tmp = match write_temp(&digest_path, digest) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&store_tmp);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&store_tmp, &store_path) {
            let _ = fs::remove_file(&store_tmp);
            let _ = fs::remove_file(&digest_tmp);
            return Err(Error::io(&store_path, e));
        }
        if let Err(e) = fs::rename(&digest_tmp, &digest_path) {
            let _ = fs::remove_file(&digest_tmp);
            return Err(Error::io(&digest_path, e));
        }
        debug!(store = %store_path.display(), digest = %digest_path.display(), "committed run");
        Ok(())
    }

    fn lock(&self) -> Result<RunLock> {
        self.ensure_dir()?;
        RunLock::acquire(&self.lock_path())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialise `value` to the temp sibling of `path`, synced to disk.
fn write_temp<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let encoded = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    let mut file = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    file.write_all(&encoded).map_err(|e| Error::io(&tmp, e))?;
    file.sync_all().map_err(|e| Error::io(&tmp, e))?;
    Ok(tmp)
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = write_temp(path, value)?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}
