use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::KeyValueStore;
use crate::errors::StorageError;

/// Longest percent-encoded key used verbatim as a file name. Common file
/// systems cap names at 255 bytes; the temporary-file affixes need room too.
const MAX_ENCODED_NAME: usize = 200;
/// Marks names derived from a key digest. `-` is always percent-encoded, so
/// these never collide with a verbatim name.
const HASHED_PREFIX: &str = "h-";

fn file_name_for(key: &str) -> String {
    let encoded = utf8_percent_encode(key, NON_ALPHANUMERIC).to_string();
    if encoded.len() <= MAX_ENCODED_NAME {
        return encoded;
    }
    format!("{HASHED_PREFIX}{}", hex::encode(Sha256::digest(key.as_bytes())))
}

/// Key length charged against the quota for a stored file. Hashed names
/// cannot be decoded, so their own length stands in for the key.
fn accounted_key_len(file_name: &str) -> usize {
    if file_name.starts_with(HASHED_PREFIX) {
        file_name.len()
    } else {
        percent_decode_str(file_name).decode_utf8_lossy().len()
    }
}

/// Directory-backed store: one file per key, named by the percent-encoded
/// key (or its SHA-256 digest when that name would be too long). Survives
/// process restarts.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::Io(format!("create {}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            quota_bytes: None,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota_bytes = Some(limit);
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for(key))
    }

    /// Quota usage of every entry except the file named `skip_name`.
    fn usage_excluding(&self, skip_name: &str) -> Result<usize, StorageError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            // Temporary files start with a dot, stored names never do.
            if name.starts_with('.') || name == skip_name {
                continue;
            }
            let len = usize::try_from(entry.metadata()?.len()).unwrap_or(usize::MAX);
            total += accounted_key_len(name).saturating_add(len);
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!("read '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("file store lock poisoned: {e}")))?;

        let name = file_name_for(key);
        if let Some(limit) = self.quota_bytes {
            let needed = self.usage_excluding(&name)? + accounted_key_len(&name) + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        let target = self.dir.join(&name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, value).map_err(|e| StorageError::Io(format!("write '{key}': {e}")))?;
        fs::rename(&tmp, &target).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StorageError::Io(format!("commit '{key}': {e}"))
        })?;
        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(format!("remove '{key}': {e}"))),
        }
    }
}
