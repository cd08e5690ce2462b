//! Minimal form for a brand-new catalog: a name and a purpose.

use client_core::EntityStore;
use serde_json::Value;
use shared::{
    domain::CatalogPurpose,
    protocol::{CatalogRecord, WritePayload},
};

use crate::{error::EditorError, persistence};

pub const NAME_REQUIRED: &str = "Catalog name is required.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationDialog {
    pub name: String,
    pub purpose: CatalogPurpose,
}

impl CreationDialog {
    pub fn new(name: impl Into<String>, purpose: Option<CatalogPurpose>) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.unwrap_or_default(),
        }
    }

    pub fn payload(&self) -> Result<WritePayload, EditorError> {
        if self.name.trim().is_empty() {
            return Err(EditorError::Validation(NAME_REQUIRED.to_string()));
        }
        let mut payload = WritePayload::default();
        payload.insert("name", Value::String(self.name.clone()));
        payload.insert("purpose", Value::String(self.purpose.as_str().to_string()));
        Ok(payload)
    }

    /// Creates the record and clears the form. On any failure the form keeps its input.
    pub async fn submit(
        &mut self,
        store: &dyn EntityStore<CatalogRecord>,
    ) -> Result<CatalogRecord, EditorError> {
        let payload = self.payload()?;
        let record = persistence::create_from_payload(store, &payload).await?;
        self.reset();
        Ok(record)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
