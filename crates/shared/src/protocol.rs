use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{CatalogId, CatalogPurpose, ProjectId, SalesPageId};

/// Fields assigned by the backend. They never travel in a write payload.
pub const SERVER_MANAGED_FIELDS: [&str; 3] = ["id", "created_date", "updated_date"];

pub fn is_server_managed(key: &str) -> bool {
    SERVER_MANAGED_FIELDS.contains(&key)
}

/// A Catalog record as stored remotely, or an unsaved draft when `id` is `None`.
///
/// Configuration fields live in `fields` untyped so that keys unknown to this
/// client survive a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CatalogId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CatalogRecord {
    pub fn draft(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn purpose(&self) -> Option<CatalogPurpose> {
        self.fields
            .get("purpose")
            .and_then(Value::as_str)
            .and_then(CatalogPurpose::parse)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Label used by selection menus: `"{name} ({purpose})"`.
    pub fn label(&self) -> String {
        let name = self.name().unwrap_or_default();
        match self.fields.get("purpose").and_then(Value::as_str) {
            Some(purpose) => format!("{name} ({purpose})"),
            None => name.to_string(),
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_date.as_deref().and_then(parse_timestamp)
    }

    /// Every configuration field, minus the server-managed ones.
    pub fn write_payload(&self) -> WritePayload {
        let mut fields = self.fields.clone();
        for key in SERVER_MANAGED_FIELDS {
            fields.remove(key);
        }
        WritePayload(fields)
    }
}

/// Backend timestamps come both with and without an offset.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WritePayload(pub Map<String, Value>);

impl WritePayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelProjectSummary {
    pub id: ProjectId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPage {
    pub id: SalesPageId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_json: Option<SalesPageDesign>,
}

impl SalesPage {
    /// Lessons that carry a playable video, in page order.
    pub fn lessons_with_video(&self) -> impl Iterator<Item = (&LessonVideo, &str)> {
        self.design_json
            .iter()
            .flat_map(|design| design.lesson_videos.iter())
            .filter_map(|lesson| match lesson.video_url.as_deref() {
                Some(url) if !url.is_empty() => Some((lesson, url)),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesPageDesign {
    #[serde(default)]
    pub lesson_videos: Vec<LessonVideo>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LessonVideo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Entity schema as published by the backend (a JSON-schema subset).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySchema {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl EntitySchema {
    /// Field name to declared default, for properties that declare one.
    pub fn defaults(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .filter_map(|(key, prop)| prop.default.clone().map(|value| (key.clone(), value)))
            .collect()
    }
}
