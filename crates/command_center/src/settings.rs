//! Read-only, typed view of a draft with defaults applied at use time.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{CatalogId, CatalogPurpose, HeroType, LogoAlignment, LogoSize, ProjectId},
    protocol::{CatalogRecord, FunnelProjectSummary},
};

use crate::defaults::CatalogDefaults;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCatalog {
    pub id: Option<CatalogId>,
    pub name: String,
    pub purpose: CatalogPurpose,
    pub hero: HeroSettings,
    pub theme: ThemeSettings,
    /// `None` when the logo is switched off.
    pub logo: Option<LogoSettings>,
    pub visible_project_ids: Vec<ProjectId>,
    pub support_url: Option<String>,
    pub footer_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeroSettings {
    pub kind: HeroType,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cta: CtaSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CtaSettings {
    pub text: Option<String>,
    pub url: Option<String>,
    pub bg_color: String,
    pub text_color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSettings {
    pub primary_color: String,
    pub secondary_color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogoSettings {
    pub url: Option<String>,
    pub size: LogoSize,
    pub alignment: LogoAlignment,
}

impl ResolvedCatalog {
    pub fn resolve(record: &CatalogRecord, defaults: &CatalogDefaults) -> Self {
        let show_logo = record
            .field("show_logo")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.show_logo);
        let logo = show_logo.then(|| LogoSettings {
            url: text(record, "logo_url"),
            size: typed(record, "logo_size").unwrap_or(defaults.logo_size),
            alignment: typed(record, "logo_alignment").unwrap_or(defaults.logo_alignment),
        });

        Self {
            id: record.id.clone(),
            name: record.name().unwrap_or_default().to_string(),
            purpose: record.purpose().unwrap_or(defaults.purpose),
            hero: HeroSettings {
                kind: typed(record, "hero_type").unwrap_or(defaults.hero_type),
                video_url: text(record, "hero_video_url"),
                image_url: text(record, "hero_image_url"),
                title: text(record, "hero_title"),
                subtitle: text(record, "hero_subtitle"),
                cta: CtaSettings {
                    text: text(record, "hero_cta_text"),
                    url: text(record, "hero_cta_url"),
                    bg_color: text(record, "hero_cta_bg_color")
                        .unwrap_or_else(|| defaults.hero_cta_bg_color.clone()),
                    text_color: text(record, "hero_cta_text_color")
                        .unwrap_or_else(|| defaults.hero_cta_text_color.clone()),
                },
            },
            theme: ThemeSettings {
                primary_color: text(record, "primary_color")
                    .unwrap_or_else(|| defaults.primary_color.clone()),
                secondary_color: text(record, "secondary_color")
                    .unwrap_or_else(|| defaults.secondary_color.clone()),
            },
            logo,
            visible_project_ids: typed(record, "visible_project_ids")
                .unwrap_or_else(|| defaults.visible_project_ids.clone()),
            support_url: text(record, "support_url"),
            footer_text: text(record, "footer_text"),
        }
    }

    /// An empty selection means every project is shown.
    pub fn is_project_visible(&self, project_id: &ProjectId) -> bool {
        self.visible_project_ids.is_empty() || self.visible_project_ids.contains(project_id)
    }

    pub fn visible_projects<'a>(
        &self,
        projects: &'a [FunnelProjectSummary],
    ) -> Vec<&'a FunnelProjectSummary> {
        projects
            .iter()
            .filter(|project| self.is_project_visible(&project.id))
            .collect()
    }
}

fn text(record: &CatalogRecord, key: &str) -> Option<String> {
    record
        .field(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Values that fail to parse fall back to the default like missing ones.
fn typed<T: DeserializeOwned>(record: &CatalogRecord, key: &str) -> Option<T> {
    record
        .field(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}
