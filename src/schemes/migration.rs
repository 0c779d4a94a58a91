use std::collections::HashSet;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::core::models::SavedScheme;
use crate::errors::StorageError;
use crate::storage::{INDEX_KEY, KeyValueStore, LEGACY_KEY, scheme_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing stored under the legacy key.
    NoLegacyData,
    /// Legacy schemes now live in the index + blob layout and the legacy key
    /// is gone.
    Migrated(Vec<SavedScheme>),
    /// The legacy value is corrupt or holds no valid scheme. It is left in
    /// place.
    Unusable,
    /// The store could not be read; whether legacy data exists is unknown.
    Unreadable,
    /// A write failed part way. The legacy key is kept so a later attempt
    /// can start over; the parsed schemes are still returned.
    WriteFailed(Vec<SavedScheme>),
}

impl MigrationOutcome {
    /// Whether another attempt could change anything.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreadable | Self::WriteFailed(_))
    }
}

/// Parse the legacy array, keeping each well-formed entry once.
fn parse_legacy(raw: &str) -> Option<Vec<SavedScheme>> {
    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Migration failed, legacy scheme data is not a JSON array: {}", e);
            return None;
        }
    };

    let mut seen = HashSet::new();
    let mut schemes = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<SavedScheme>(entry) {
            Ok(scheme) => {
                if seen.insert(scheme.id.clone()) {
                    schemes.push(scheme);
                } else {
                    warn!(position, id = %scheme.id, "Dropping duplicate legacy scheme");
                }
            }
            Err(e) => warn!(position, "Dropping malformed legacy scheme: {}", e),
        }
    }
    Some(schemes)
}

/// Restore every blob key touched by a failed run to what it held before.
fn roll_back<S: KeyValueStore + ?Sized>(store: &S, written: &[(String, Option<String>)]) {
    for (key, previous) in written.iter().rev() {
        let restored = match previous {
            Some(value) => store.set(key, value),
            None => store.remove(key),
        };
        if let Err(e) = restored {
            error!(key = %key, "Could not roll back migrated scheme: {}", e);
        }
    }
}

/// Ids already in the index that the legacy data does not know about. They
/// were added after the legacy blob was written, so they stay in front.
fn newer_index_ids<S: KeyValueStore + ?Sized>(
    store: &S,
    legacy_ids: &HashSet<&str>,
) -> Result<Vec<String>, StorageError> {
    let Some(raw) = store.get(INDEX_KEY)? else {
        return Ok(Vec::new());
    };
    let ids: Vec<String> = serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Scheme index is corrupt, replacing it with legacy order: {}", e);
        Vec::new()
    });
    Ok(ids
        .into_iter()
        .filter(|id| !legacy_ids.contains(id.as_str()))
        .collect())
}

/// Move schemes stored under [`LEGACY_KEY`] into the index + blob layout.
///
/// Blobs are written before the index, and the legacy key is removed last.
/// If any write fails the blobs written so far are rolled back, so a failed
/// run leaves the store as it found it.
pub fn migrate_legacy<S: KeyValueStore + ?Sized>(store: &S) -> MigrationOutcome {
    let raw = match store.get(LEGACY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return MigrationOutcome::NoLegacyData,
        Err(e) => {
            warn!("Could not check for legacy schemes: {}", e);
            return MigrationOutcome::Unreadable;
        }
    };

    let Some(schemes) = parse_legacy(&raw) else {
        return MigrationOutcome::Unusable;
    };
    if schemes.is_empty() {
        warn!("Legacy scheme data holds no usable schemes, leaving it in place");
        return MigrationOutcome::Unusable;
    }

    // Each blob key written so far, with what it held before this run.
    let mut written: Vec<(String, Option<String>)> = Vec::with_capacity(schemes.len());
    let mut failure = None;
    for scheme in &schemes {
        let key = scheme_key(&scheme.id);
        let result = store.get(&key).and_then(|previous| {
            let blob = serde_json::to_string(scheme)?;
            store.set(&key, &blob)?;
            written.push((key, previous));
            Ok(())
        });
        if let Err(e) = result {
            failure = Some((scheme.id.clone(), e));
            break;
        }
    }
    if let Some((id, e)) = failure {
        error!(id = %id, "Migration failed writing scheme: {}", e);
        roll_back(store, &written);
        return MigrationOutcome::WriteFailed(schemes);
    }

    let result = {
        let legacy_ids: HashSet<&str> = schemes.iter().map(|s| s.id.as_str()).collect();
        newer_index_ids(store, &legacy_ids).and_then(|mut ids| {
            ids.extend(schemes.iter().map(|s| s.id.clone()));
            let index = serde_json::to_string(&ids)?;
            store.set(INDEX_KEY, &index)
        })
    };
    if let Err(e) = result {
        error!("Migration failed writing scheme index: {}", e);
        roll_back(store, &written);
        return MigrationOutcome::WriteFailed(schemes);
    }

    if let Err(e) = store.remove(LEGACY_KEY) {
        // The new layout is complete; a leftover legacy key is only retried.
        error!("Migrated schemes but could not remove legacy data: {}", e);
    }

    info!(count = schemes.len(), "Migrated legacy schemes");
    MigrationOutcome::Migrated(schemes)
}

/// Remove `id` from legacy data that has not been migrated yet, so a delete
/// issued while the migration keeps failing still takes effect.
pub fn drop_legacy_entry<S: KeyValueStore + ?Sized>(store: &S, id: &str) {
    let raw = match store.get(LEGACY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return,
        Err(e) => {
            warn!(id, "Could not read legacy schemes to delete from: {}", e);
            return;
        }
    };
    let Ok(entries) = serde_json::from_str::<Vec<Value>>(&raw) else {
        return;
    };

    let before = entries.len();
    let remaining: Vec<Value> = entries
        .into_iter()
        .filter(|entry| entry.get("id").and_then(Value::as_str) != Some(id))
        .collect();
    if remaining.len() == before {
        return;
    }

    let written = serde_json::to_string(&remaining)
        .map_err(StorageError::from)
        .and_then(|value| store.set(LEGACY_KEY, &value));
    if let Err(e) = written {
        warn!(id, "Failed to delete scheme from legacy data: {}", e);
    }
}
