//! Public catalog URLs and CTA link targets taken from sales-page lessons.

use shared::{
    domain::{CatalogId, SalesPageId},
    protocol::{CatalogRecord, SalesPage},
};
use url::Url;

use crate::error::EditorError;

const CATALOG_PAGE: &str = "Catalogo";

#[derive(Debug, Clone)]
pub struct PublicLinks {
    origin: Url,
}

impl PublicLinks {
    pub fn new(origin: Url) -> Result<Self, EditorError> {
        if origin.cannot_be_a_base() {
            return Err(EditorError::InvalidPublicOrigin(origin.to_string()));
        }
        Ok(Self { origin })
    }

    /// `{origin}/Catalogo?id={id}`
    pub fn catalog_url(&self, catalog_id: &CatalogId) -> Url {
        let mut url = self.origin.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(CATALOG_PAGE);
        }
        url.query_pairs_mut()
            .append_pair("id", catalog_id.as_str());
        url
    }

    /// Only persisted records have a public page.
    pub fn for_record(&self, record: &CatalogRecord) -> Option<Url> {
        record.id.as_ref().map(|id| self.catalog_url(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaTarget {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtaTargetGroup {
    pub page_id: SalesPageId,
    pub page_name: String,
    pub targets: Vec<CtaTarget>,
}

/// One group per sales page that has at least one lesson video.
pub fn cta_targets(pages: &[SalesPage]) -> Vec<CtaTargetGroup> {
    pages
        .iter()
        .filter_map(|page| {
            let targets: Vec<_> = page
                .lessons_with_video()
                .enumerate()
                .map(|(index, (lesson, url))| CtaTarget {
                    label: format!("Lesson {}: {}", index + 1, lesson.title),
                    url: url.to_string(),
                })
                .collect();
            (!targets.is_empty()).then(|| CtaTargetGroup {
                page_id: page.id.clone(),
                page_name: page.name.clone(),
                targets,
            })
        })
        .collect()
}
