//! Create-vs-update branching for the active draft.

use std::sync::atomic::{AtomicBool, Ordering};

use client_core::{EntityStore, StoreError};
use serde_json::Value;
use shared::{
    domain::CatalogId,
    protocol::{CatalogRecord, WritePayload},
};
use tracing::{info, warn};

use crate::{defaults::CatalogDefaults, draft::DraftController, selector::CatalogSelector};

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Updated {
        catalog_id: CatalogId,
        confirmation: Value,
    },
    Created {
        record: CatalogRecord,
    },
}

/// Writes `draft`: an update when it carries an id, a create otherwise.
pub async fn write_draft(
    store: &dyn EntityStore<CatalogRecord>,
    draft: &CatalogRecord,
) -> Result<SaveOutcome, StoreError> {
    let payload = draft.write_payload();
    match &draft.id {
        Some(catalog_id) => {
            // Last writer wins: no version check against the stored record.
            let confirmation = store.update(catalog_id.as_str(), &payload).await?;
            info!(catalog_id = %catalog_id, "catalog updated");
            Ok(SaveOutcome::Updated {
                catalog_id: catalog_id.clone(),
                confirmation,
            })
        }
        None => {
            let record = store.create(&payload).await?;
            info!(catalog_id = ?record.id, "catalog created");
            Ok(SaveOutcome::Created { record })
        }
    }
}

pub async fn create_from_payload(
    store: &dyn EntityStore<CatalogRecord>,
    payload: &WritePayload,
) -> Result<CatalogRecord, StoreError> {
    let record = store.create(payload).await?;
    info!(catalog_id = ?record.id, "catalog created");
    Ok(record)
}

/// Makes a freshly created record the active draft: refreshes the list and
/// selects the record by id. Falls back to the create response when the list
/// cannot be fetched or does not contain it yet.
pub async fn adopt_created(
    store: &dyn EntityStore<CatalogRecord>,
    defaults: &CatalogDefaults,
    selector: &mut CatalogSelector,
    draft: &mut DraftController,
    created: &CatalogRecord,
) {
    if let Err(err) = selector.refresh(store, defaults, draft).await {
        warn!(error = %err, "catalog list refresh after create failed");
    }
    let listed = created.id.as_ref().and_then(|id| selector.find(id)).cloned();
    draft.load(listed.unwrap_or_else(|| created.clone()));
}

/// One save at a time. A second caller is turned away instead of queued.
#[derive(Default)]
pub struct SaveGate {
    saving: AtomicBool,
}

impl SaveGate {
    pub fn try_begin(&self) -> Option<SaveGuard<'_>> {
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SaveGuard { gate: self })
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }
}

pub struct SaveGuard<'a> {
    gate: &'a SaveGate,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.gate.saving.store(false, Ordering::Release);
    }
}
