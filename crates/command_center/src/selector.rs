//! Last-known list of catalogs and selection of the active one.

use client_core::{EntityListing, EntityStore, StoreError};
use shared::{domain::CatalogId, protocol::CatalogRecord};
use tracing::debug;

use crate::{defaults::CatalogDefaults, draft::DraftController, error::EditorError};

#[derive(Default)]
pub struct CatalogSelector {
    catalogs: Vec<CatalogRecord>,
}

impl CatalogSelector {
    pub fn catalogs(&self) -> &[CatalogRecord] {
        &self.catalogs
    }

    pub fn find(&self, id: &CatalogId) -> Option<&CatalogRecord> {
        self.catalogs
            .iter()
            .find(|catalog| catalog.id.as_ref() == Some(id))
    }

    /// Fetches the list and activates its first entry, or a default draft when
    /// the list is empty. On failure neither the list nor the draft changes.
    pub async fn refresh(
        &mut self,
        store: &dyn EntityStore<CatalogRecord>,
        defaults: &CatalogDefaults,
        draft: &mut DraftController,
    ) -> Result<&[CatalogRecord], StoreError> {
        let listed = store.list().await?;
        self.apply(listed, defaults, draft);
        Ok(&self.catalogs)
    }

    pub fn apply(
        &mut self,
        listed: Vec<CatalogRecord>,
        defaults: &CatalogDefaults,
        draft: &mut DraftController,
    ) {
        debug!(count = listed.len(), "catalog list replaced");
        self.catalogs = listed;
        match self.catalogs.first() {
            Some(first) => draft.load(first.clone()),
            None => draft.load(defaults.new_draft()),
        };
    }

    pub fn select(&self, id: &CatalogId, draft: &mut DraftController) -> Result<(), EditorError> {
        let record = self
            .find(id)
            .ok_or_else(|| EditorError::NotFound(id.clone()))?;
        draft.load(record.clone());
        Ok(())
    }
}
