use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::KeyValueStore;
use crate::errors::StorageError;

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// In-process store. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    disabled: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the summed key and value lengths past
    /// `limit`.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota_bytes: Some(limit),
            ..Self::default()
        }
    }

    /// A store whose every call fails, like storage switched off by the
    /// host.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Bytes currently held, counted the same way as the quota.
    #[must_use]
    pub fn usage(&self) -> usize {
        self.lock()
            .map(|entries| entries.iter().map(|(k, v)| entry_size(k, v)).sum())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable(
                "memory store is disabled".to_string(),
            ));
        }
        self.entries
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("memory store lock poisoned: {e}")))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.lock()?;

        if let Some(limit) = self.quota_bytes {
            let current: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map_or(0, |old| entry_size(key, old));
            let needed = current - replaced + entry_size(key, value);
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
