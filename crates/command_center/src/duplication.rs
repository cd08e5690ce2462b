use serde_json::Value;
use shared::protocol::{CatalogRecord, WritePayload};

pub const COPY_SUFFIX: &str = " (Copy)";

/// Payload for a copy of a persisted catalog; `None` for an unsaved draft.
pub fn duplicate_payload(source: &CatalogRecord) -> Option<WritePayload> {
    if !source.is_persisted() {
        return None;
    }
    let mut payload = source.write_payload();
    let name = format!("{}{COPY_SUFFIX}", source.name().unwrap_or_default());
    payload.insert("name", Value::String(name));
    Some(payload)
}
