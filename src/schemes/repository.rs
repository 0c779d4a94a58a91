use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::SchemeStore;
use super::migration::{MigrationOutcome, drop_legacy_entry, migrate_legacy};
use crate::core::models::SavedScheme;
use crate::errors::StorageError;
use crate::storage::{INDEX_KEY, KeyValueStore, scheme_key};

/// Scheme persistence over a [`KeyValueStore`].
///
/// The first operation on a repository moves any legacy single-blob data
/// into the index + blob layout; later operations skip the check.
#[derive(Debug)]
pub struct SchemeRepository<S> {
    store: S,
    legacy_checked: AtomicBool,
}

impl<S: KeyValueStore> SchemeRepository<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            legacy_checked: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Run the legacy migration unless this repository already has.
    ///
    /// Returns the legacy schemes when they are still waiting to be migrated
    /// because this attempt could not finish.
    fn ensure_migrated(&self) -> Option<Vec<SavedScheme>> {
        if self.legacy_checked.swap(true, Ordering::AcqRel) {
            return None;
        }

        let outcome = migrate_legacy(&self.store);
        if outcome.is_retryable() {
            self.legacy_checked.store(false, Ordering::Release);
        }
        match outcome {
            MigrationOutcome::WriteFailed(pending) => Some(pending),
            MigrationOutcome::Migrated(_)
            | MigrationOutcome::NoLegacyData
            | MigrationOutcome::Unusable
            | MigrationOutcome::Unreadable => None,
        }
    }

    fn list_indexed(&self) -> Vec<SavedScheme> {
        let ids = match self.load_index() {
            Ok(Some(ids)) => ids,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("Failed to load schemes: {}", e);
                return Vec::new();
            }
        };

        dedup_preserving_order(ids)
            .iter()
            .filter_map(|id| self.read_blob(id))
            .collect()
    }

    /// `Ok(None)` when the index is absent or corrupt; `Err` only when the
    /// store could not be read, so callers know not to overwrite it.
    fn load_index(&self) -> Result<Option<Vec<String>>, StorageError> {
        let Some(raw) = self.store.get(INDEX_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Ok(Some(ids)),
            Err(e) => {
                error!("Scheme index is corrupt, treating it as empty: {}", e);
                Ok(None)
            }
        }
    }

    fn write_index(&self, ids: &[String]) {
        let written = serde_json::to_string(ids)
            .map_err(StorageError::from)
            .and_then(|raw| self.store.set(INDEX_KEY, &raw));
        if let Err(e) = written {
            warn!("Failed to write scheme index: {}", e);
        }
    }

    fn read_blob(&self, id: &str) -> Option<SavedScheme> {
        let key = scheme_key(id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(id, "Index entry has no stored scheme, skipping");
                return None;
            }
            Err(e) => {
                warn!(id, "Failed to read scheme: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<SavedScheme>(&raw) {
            Ok(scheme) if scheme.id == id => Some(scheme),
            Ok(scheme) => {
                warn!(id, stored_id = %scheme.id, "Stored scheme id does not match its key, skipping");
                None
            }
            Err(e) => {
                #[cfg(feature = "debug-logs")]
                warn!(id, raw = %raw, "Stored scheme is corrupt, skipping: {}", e);
                #[cfg(not(feature = "debug-logs"))]
                warn!(id, "Stored scheme is corrupt, skipping: {}", e);
                None
            }
        }
    }
}

fn dedup_preserving_order<I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[async_trait]
impl<S: KeyValueStore> SchemeStore for SchemeRepository<S> {
    async fn list_schemes(&self) -> Vec<SavedScheme> {
        let pending = self.ensure_migrated();
        let mut schemes = self.list_indexed();

        // Schemes saved since the last failed migration are newer than any
        // legacy entry, so they stay in front.
        if let Some(legacy) = pending {
            let listed: HashSet<String> = schemes.iter().map(|s| s.id.clone()).collect();
            schemes.extend(legacy.into_iter().filter(|s| !listed.contains(&s.id)));
        }
        schemes
    }

    async fn add_scheme(&self, scheme: &SavedScheme) {
        self.ensure_migrated();

        let written = serde_json::to_string(scheme)
            .map_err(StorageError::from)
            .and_then(|blob| self.store.set(&scheme_key(&scheme.id), &blob));
        if let Err(e) = written {
            // Listing the id without its blob would only hide it again.
            error!(id = %scheme.id, "Failed to save scheme: {}", e);
            return;
        }

        let mut ids = match self.load_index() {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                error!(id = %scheme.id, "Saved scheme but could not read the index: {}", e);
                return;
            }
        };
        if !ids.contains(&scheme.id) {
            ids.insert(0, scheme.id.clone());
            self.write_index(&ids);
        }
    }

    async fn update_scheme(&self, scheme: &SavedScheme) {
        self.ensure_migrated();

        let key = scheme_key(&scheme.id);
        let blob = match serde_json::to_string(scheme) {
            Ok(blob) => blob,
            Err(e) => {
                error!(id = %scheme.id, "Failed to serialize scheme: {}", e);
                return;
            }
        };

        let existing = self.store.get(&key).unwrap_or_else(|e| {
            warn!(id = %scheme.id, "Could not read stored scheme before update: {}", e);
            None
        });
        if existing.as_deref() == Some(blob.as_str()) {
            debug!(id = %scheme.id, "Scheme unchanged, skipping write");
            return;
        }

        if let Err(e) = self.store.set(&key, &blob) {
            error!(id = %scheme.id, "Failed to update scheme: {}", e);
        }
    }

    async fn delete_scheme(&self, id: &str) {
        if self.ensure_migrated().is_some() {
            drop_legacy_entry(&self.store, id);
        }

        if let Err(e) = self.store.remove(&scheme_key(id)) {
            warn!(id, "Failed to remove stored scheme: {}", e);
        }

        match self.load_index() {
            Ok(Some(ids)) => {
                let remaining: Vec<String> = ids.into_iter().filter(|i| i != id).collect();
                self.write_index(&remaining);
            }
            Ok(None) => {}
            Err(e) => warn!(id, "Could not read the index to delete scheme: {}", e),
        }
    }

    async fn save_schemes_order(&self, schemes: &[SavedScheme]) {
        self.ensure_migrated();

        let ids = dedup_preserving_order(schemes.iter().map(|s| s.id.clone()));
        self.write_index(&ids);
    }
}
