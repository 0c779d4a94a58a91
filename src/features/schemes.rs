use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::core::models::{MockupConfig, SavedScheme};
use crate::errors::SchemeError;
use crate::schemes::SchemeStore;

/// A question the editor must put to the user before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Replace the stored configuration of `name` with the live one.
    Overwrite { name: String },
    /// Replace the live configuration with the one stored under `name`.
    Load { name: String },
    Rename { from: String, to: String },
    Delete { name: String },
}

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &Prompt) -> bool;
}

/// Accepts every prompt. For headless callers and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

#[async_trait]
impl Confirm for AlwaysConfirm {
    async fn confirm(&self, _prompt: &Prompt) -> bool {
        true
    }
}

fn clean_name(name: &str) -> Result<String, SchemeError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SchemeError::EmptyName);
    }
    Ok(name.to_string())
}

/// The save/load/rename/delete workflows behind the editor's scheme panel.
pub struct SchemeService<R, C> {
    store: R,
    confirm: C,
}

impl<R: SchemeStore, C: Confirm> SchemeService<R, C> {
    pub fn new(store: R, confirm: C) -> Self {
        Self { store, confirm }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn confirmer(&self) -> &C {
        &self.confirm
    }

    pub async fn list(&self) -> Vec<SavedScheme> {
        self.store.list_schemes().await
    }

    async fn find(&self, id: &str) -> Result<SavedScheme, SchemeError> {
        self.store
            .list_schemes()
            .await
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SchemeError::NotFound(id.to_string()))
    }

    async fn ask(&self, prompt: Prompt) -> Result<(), SchemeError> {
        if self.confirm.confirm(&prompt).await {
            Ok(())
        } else {
            info!(?prompt, "User declined");
            Err(SchemeError::Cancelled)
        }
    }

    /// Snapshot `config` as a new scheme at the top of the list.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeError::EmptyName`] if `name` is blank.
    pub async fn save_new(
        &self,
        name: &str,
        config: &MockupConfig,
    ) -> Result<SavedScheme, SchemeError> {
        let scheme = SavedScheme::capture(&clean_name(name)?, config);
        self.store.add_scheme(&scheme).await;
        info!(id = %scheme.id, "Saved new scheme");
        Ok(scheme)
    }

    /// Replace a saved scheme's configuration with `config`, keeping its id
    /// and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme does not exist or the user declines.
    pub async fn overwrite(
        &self,
        id: &str,
        config: &MockupConfig,
    ) -> Result<SavedScheme, SchemeError> {
        let mut scheme = self.find(id).await?;
        self.ask(Prompt::Overwrite {
            name: scheme.name.clone(),
        })
        .await?;

        scheme.config = config.clone();
        scheme.saved_at = Utc::now().timestamp_millis();
        self.store.update_scheme(&scheme).await;
        Ok(scheme)
    }

    /// # Errors
    ///
    /// Returns an error if `new_name` is blank, the scheme does not exist or
    /// the user declines.
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<SavedScheme, SchemeError> {
        let new_name = clean_name(new_name)?;
        let mut scheme = self.find(id).await?;
        if scheme.name == new_name {
            return Ok(scheme);
        }
        self.ask(Prompt::Rename {
            from: scheme.name.clone(),
            to: new_name.clone(),
        })
        .await?;

        scheme.name = new_name;
        self.store.update_scheme(&scheme).await;
        Ok(scheme)
    }

    /// Copy of the configuration stored under `id`, for the editor to adopt.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme does not exist or the user declines.
    pub async fn load(&self, id: &str) -> Result<MockupConfig, SchemeError> {
        let scheme = self.find(id).await?;
        self.ask(Prompt::Load { name: scheme.name }).await?;
        Ok(scheme.config)
    }

    /// # Errors
    ///
    /// Returns an error if the scheme does not exist or the user declines.
    pub async fn delete(&self, id: &str) -> Result<(), SchemeError> {
        let scheme = self.find(id).await?;
        self.ask(Prompt::Delete { name: scheme.name }).await?;
        self.store.delete_scheme(id).await;
        Ok(())
    }

    /// Persist a drag-reordered list. `ids` go first in the given order;
    /// listed schemes missing from `ids` follow in their previous order, and
    /// unknown ids are ignored.
    pub async fn reorder(&self, ids: &[&str]) -> Vec<SavedScheme> {
        let mut remaining = self.store.list_schemes().await;
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(pos) = remaining.iter().position(|s| s.id == *id) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);

        self.store.save_schemes_order(&ordered).await;
        ordered
    }
}
