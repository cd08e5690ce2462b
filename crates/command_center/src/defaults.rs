//! Typed defaults for Catalog fields.
//!
//! The same table seeds a blank draft when the backend holds no catalogs and
//! fills unset fields at use time. It must agree with the defaults declared by
//! the backend schema; [`CatalogDefaults::validate_against`] is run at startup.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::{
    domain::{CatalogPurpose, HeroType, LogoAlignment, LogoSize, ProjectId},
    protocol::{CatalogRecord, EntitySchema},
};
use thiserror::Error;

/// Name given to the draft synthesized when no catalog exists yet.
pub const NEW_CATALOG_NAME: &str = "Novo Catálogo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefaults {
    pub purpose: CatalogPurpose,
    pub hero_type: HeroType,
    pub hero_cta_bg_color: String,
    pub hero_cta_text_color: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub show_logo: bool,
    pub logo_size: LogoSize,
    pub logo_alignment: LogoAlignment,
    pub visible_project_ids: Vec<ProjectId>,
}

impl Default for CatalogDefaults {
    fn default() -> Self {
        Self {
            purpose: CatalogPurpose::General,
            hero_type: HeroType::Video,
            hero_cta_bg_color: "#FFFFFF".into(),
            hero_cta_text_color: "#000000".into(),
            primary_color: "#FFFFFF".into(),
            secondary_color: "#111827".into(),
            show_logo: false,
            logo_size: LogoSize::Md,
            logo_alignment: LogoAlignment::Left,
            visible_project_ids: Vec::new(),
        }
    }
}

impl CatalogDefaults {
    pub fn fields(&self) -> Map<String, Value> {
        let text = |value: &str| Value::String(value.to_string());
        let mut fields = Map::new();
        fields.insert("purpose".into(), text(self.purpose.as_str()));
        fields.insert("hero_type".into(), text(self.hero_type.as_str()));
        fields.insert("hero_cta_bg_color".into(), text(&self.hero_cta_bg_color));
        fields.insert("hero_cta_text_color".into(), text(&self.hero_cta_text_color));
        fields.insert("primary_color".into(), text(&self.primary_color));
        fields.insert("secondary_color".into(), text(&self.secondary_color));
        fields.insert("show_logo".into(), Value::Bool(self.show_logo));
        fields.insert("logo_size".into(), text(self.logo_size.as_str()));
        fields.insert("logo_alignment".into(), text(self.logo_alignment.as_str()));
        fields.insert(
            "visible_project_ids".into(),
            Value::Array(
                self.visible_project_ids
                    .iter()
                    .map(|id| text(id.as_str()))
                    .collect(),
            ),
        );
        fields
    }

    /// Unsaved draft carrying every default plus the placeholder name.
    pub fn new_draft(&self) -> CatalogRecord {
        let mut fields = self.fields();
        fields.insert("name".into(), Value::String(NEW_CATALOG_NAME.to_string()));
        CatalogRecord::draft(fields)
    }

    pub fn validate_against(&self, schema: &EntitySchema) -> Result<(), DefaultsMismatch> {
        let ours = self.fields();
        let theirs = schema.defaults();
        let mut diffs = Vec::new();

        for (field, value) in &ours {
            match (schema.properties.get(field), theirs.get(field)) {
                (None, _) => diffs.push(DefaultDiff::UnknownField(field.clone())),
                (Some(_), None) => diffs.push(DefaultDiff::NotDeclared(field.clone())),
                (Some(_), Some(declared)) if declared != value => {
                    diffs.push(DefaultDiff::Different {
                        field: field.clone(),
                        ours: value.clone(),
                        theirs: declared.clone(),
                    })
                }
                _ => {}
            }
        }
        for field in theirs.keys().filter(|field| !ours.contains_key(*field)) {
            diffs.push(DefaultDiff::Missing(field.clone()));
        }

        if diffs.is_empty() {
            Ok(())
        } else {
            Err(DefaultsMismatch { diffs })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultDiff {
    /// The schema has no such property.
    UnknownField(String),
    /// The schema knows the property but declares no default for it.
    NotDeclared(String),
    /// The schema declares a default the table does not carry.
    Missing(String),
    Different {
        field: String,
        ours: Value,
        theirs: Value,
    },
}

impl fmt::Display for DefaultDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "{field}: not in schema"),
            Self::NotDeclared(field) => write!(f, "{field}: schema declares no default"),
            Self::Missing(field) => write!(f, "{field}: missing from defaults table"),
            Self::Different {
                field,
                ours,
                theirs,
            } => write!(f, "{field}: table has {ours}, schema has {theirs}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("catalog defaults diverge from backend schema: {}", render_diffs(.diffs))]
pub struct DefaultsMismatch {
    pub diffs: Vec<DefaultDiff>,
}

fn render_diffs(diffs: &[DefaultDiff]) -> String {
    diffs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
