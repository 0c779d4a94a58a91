//! Saved-scheme persistence.
//!
//! # Layout
//!
//! ```text
//! mockup_scheme_ids   ["b","a"]            # display order, newest first
//! scheme_a            {"id":"a",...}       # one blob per scheme
//! scheme_b            {"id":"b",...}
//! mockup_schemes      [{"id":"x",...}]     # legacy single blob, migrated once
//! ```

pub mod migration;
pub mod repository;

use async_trait::async_trait;

use crate::core::models::SavedScheme;

pub use migration::{MigrationOutcome, drop_legacy_entry, migrate_legacy};
pub use repository::SchemeRepository;

/// The operations the editor UI calls to manage saved schemes.
///
/// All operations are async so a networked or file-backed store can sit
/// behind the same interface. None of them fail: storage problems degrade to
/// "as if the data did not exist" and are logged.
#[async_trait]
pub trait SchemeStore: Send + Sync {
    /// Saved schemes in display order. Entries whose blob is missing or
    /// unreadable are skipped.
    async fn list_schemes(&self) -> Vec<SavedScheme>;

    /// Store `scheme` and put its id at the front of the index. Adding an id
    /// that is already listed rewrites its blob but leaves the order alone.
    async fn add_scheme(&self, scheme: &SavedScheme);

    /// Overwrite the blob for an already listed scheme. Skips the write when
    /// the serialized form is unchanged. The index is not touched.
    async fn update_scheme(&self, scheme: &SavedScheme);

    /// Remove the scheme's blob and its index entry. Unknown ids are a no-op.
    async fn delete_scheme(&self, id: &str);

    /// Replace the index with the ids of `schemes`, in that order.
    async fn save_schemes_order(&self, schemes: &[SavedScheme]);
}
