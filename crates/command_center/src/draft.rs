//! The single editable copy of a Catalog.

use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::ProjectId,
    protocol::{is_server_managed, CatalogRecord},
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{error::EditorError, events::EditorEvent};

/// Holds the active draft as an immutable snapshot. Every edit swaps in a new
/// snapshot, so snapshots handed out earlier never change underneath a reader.
pub struct DraftController {
    current: Option<Arc<CatalogRecord>>,
    events: broadcast::Sender<EditorEvent>,
}

impl DraftController {
    pub fn new(events: broadcast::Sender<EditorEvent>) -> Self {
        Self {
            current: None,
            events,
        }
    }

    pub fn current(&self) -> Option<Arc<CatalogRecord>> {
        self.current.clone()
    }

    /// Replaces the draft wholesale.
    pub fn load(&mut self, record: CatalogRecord) -> Arc<CatalogRecord> {
        let catalog_id = record.id.clone();
        debug!(catalog_id = ?catalog_id, "draft replaced");
        let snapshot = Arc::new(record);
        self.current = Some(Arc::clone(&snapshot));
        let _ = self.events.send(EditorEvent::DraftReplaced { catalog_id });
        snapshot
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> Result<Arc<CatalogRecord>, EditorError> {
        if is_server_managed(key) {
            return Err(EditorError::ServerManagedField(key.to_string()));
        }
        let current = self.current.as_ref().ok_or(EditorError::NoDraft)?;
        let mut next = CatalogRecord::clone(current);
        next.fields.insert(key.to_string(), value);

        debug!(field = key, "draft field changed");
        let snapshot = Arc::new(next);
        self.current = Some(Arc::clone(&snapshot));
        let _ = self.events.send(EditorEvent::FieldChanged {
            key: key.to_string(),
        });
        Ok(snapshot)
    }

    /// Adds or removes one project from `visible_project_ids`, keeping entries unique.
    pub fn toggle_visible_project(
        &mut self,
        project_id: &ProjectId,
        visible: bool,
    ) -> Result<Arc<CatalogRecord>, EditorError> {
        let current = self.current.as_ref().ok_or(EditorError::NoDraft)?;
        let mut ids = visible_project_ids(current);
        let present = ids.iter().any(|id| id == project_id.as_str());
        if visible && !present {
            ids.push(project_id.as_str().to_string());
        } else if !visible {
            ids.retain(|id| id != project_id.as_str());
        }
        let value = Value::Array(ids.into_iter().map(Value::String).collect());
        self.set_field("visible_project_ids", value)
    }
}

fn visible_project_ids(record: &CatalogRecord) -> Vec<String> {
    record
        .field("visible_project_ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
