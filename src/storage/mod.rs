//! String-keyed persistent storage.
//!
//! The repository only ever needs three calls on its backing store, so the
//! adapter is kept to `get`/`set`/`remove`. Reads of a missing key are
//! `Ok(None)`; errors are reserved for the medium itself misbehaving
//! (disabled, over quota, I/O failure).

pub mod file;
pub mod memory;

use std::sync::Arc;

use crate::core::config::{StoreBackend, StoreConfig};
use crate::errors::StorageError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Single-blob format written by the first releases of the editor.
pub const LEGACY_KEY: &str = "mockup_schemes";
/// Ordered list of scheme ids; its order is the display order.
pub const INDEX_KEY: &str = "mockup_scheme_ids";
pub const SCHEME_PREFIX: &str = "scheme_";

#[must_use]
pub fn scheme_key(id: &str) -> String {
    format!("{SCHEME_PREFIX}{id}")
}

pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error only if the storage medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the medium is unavailable or the write would
    /// exceed its quota.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium is unavailable.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Open the backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the file backend's directory cannot be created.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn KeyValueStore>, StorageError> {
    match &config.backend {
        StoreBackend::Memory => {
            let store = match config.quota_bytes {
                Some(limit) => MemoryStore::with_quota(limit),
                None => MemoryStore::new(),
            };
            Ok(Box::new(store))
        }
        StoreBackend::File { dir } => {
            let mut store = FileStore::open(dir)?;
            if let Some(limit) = config.quota_bytes {
                store = store.with_quota(limit);
            }
            Ok(Box::new(store))
        }
    }
}
