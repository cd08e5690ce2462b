//! The editor facade: store handles, loading gate, save gate and notifications.

use std::sync::Arc;

use client_core::{EntityListing, EntityStore, ImageFile, ImageUploader};
use serde_json::Value;
use shared::{
    domain::{CatalogId, ProjectId},
    protocol::{CatalogRecord, FunnelProjectSummary, SalesPage},
};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{info, warn};
use url::Url;

use crate::{
    creation::CreationDialog,
    defaults::CatalogDefaults,
    draft::DraftController,
    duplication::duplicate_payload,
    error::EditorError,
    events::{EditorEvent, LoadPhase, Notification},
    links::{cta_targets, CtaTargetGroup, PublicLinks},
    persistence::{self, SaveGate, SaveOutcome},
    selector::CatalogSelector,
    settings::ResolvedCatalog,
};

const LOAD_FAILED: &str = "Failed to load settings.";
const SAVE_FAILED: &str = "Failed to save settings.";
const DUPLICATE_FAILED: &str = "Failed to duplicate catalog.";
const CREATE_FAILED: &str = "Failed to create catalog.";
const UPLOAD_FAILED: &str = "Failed to upload image.";

/// Backend handles for every record kind the editor touches.
pub struct Stores {
    pub catalogs: Arc<dyn EntityStore<CatalogRecord>>,
    pub projects: Arc<dyn EntityListing<FunnelProjectSummary>>,
    pub sales_pages: Arc<dyn EntityListing<SalesPage>>,
}

/// Catalog fields filled by the image upload collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField {
    HeroImage,
    Logo,
}

impl ImageField {
    pub fn key(self) -> &'static str {
        match self {
            Self::HeroImage => "hero_image_url",
            Self::Logo => "logo_url",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HeroImage => "Hero background image",
            Self::Logo => "Logo file",
        }
    }
}

struct EditorState {
    phase: LoadPhase,
    selector: CatalogSelector,
    draft: DraftController,
    projects: Vec<FunnelProjectSummary>,
    sales_pages: Vec<SalesPage>,
}

pub struct CommandCenter {
    stores: Stores,
    defaults: CatalogDefaults,
    links: PublicLinks,
    state: Mutex<EditorState>,
    save_gate: SaveGate,
    events: broadcast::Sender<EditorEvent>,
}

impl CommandCenter {
    pub fn new(stores: Stores, defaults: CatalogDefaults, links: PublicLinks) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            stores,
            defaults,
            links,
            state: Mutex::new(EditorState {
                phase: LoadPhase::Loading,
                selector: CatalogSelector::default(),
                draft: DraftController::new(events.clone()),
                projects: Vec::new(),
                sales_pages: Vec::new(),
            }),
            save_gate: SaveGate::default(),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn is_saving(&self) -> bool {
        self.save_gate.is_saving()
    }

    pub async fn phase(&self) -> LoadPhase {
        self.state.lock().await.phase
    }

    /// Checks the defaults table against the schema, loads catalogs, then loads
    /// projects and sales pages concurrently. Nothing is committed unless every
    /// request succeeds.
    pub async fn initialize(&self) -> Result<(), EditorError> {
        self.set_phase(LoadPhase::Loading).await;
        match self.load_everything().await {
            Ok((catalogs, projects, sales_pages)) => {
                let mut state = self.state.lock().await;
                let EditorState {
                    selector, draft, ..
                } = &mut *state;
                selector.apply(catalogs, &self.defaults, draft);
                state.projects = projects;
                state.sales_pages = sales_pages;
                state.phase = LoadPhase::Ready;
                let count = state.selector.catalogs().len();
                drop(state);
                info!(catalogs = count, "command center ready");
                self.emit(EditorEvent::CatalogsRefreshed { count });
                self.emit(EditorEvent::PhaseChanged(LoadPhase::Ready));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "initial load failed");
                self.set_phase(LoadPhase::Failed).await;
                self.notify(Notification::error(LOAD_FAILED));
                Err(err)
            }
        }
    }

    async fn load_everything(
        &self,
    ) -> Result<(Vec<CatalogRecord>, Vec<FunnelProjectSummary>, Vec<SalesPage>), EditorError>
    {
        let (schema, catalogs) =
            futures::try_join!(self.stores.catalogs.schema(), self.stores.catalogs.list())?;
        self.defaults.validate_against(&schema)?;
        let (projects, sales_pages) =
            futures::try_join!(self.stores.projects.list(), self.stores.sales_pages.list())?;
        Ok((catalogs, projects, sales_pages))
    }

    pub async fn refresh(&self) -> Result<(), EditorError> {
        let mut state = self.ready_state().await?;
        let EditorState {
            selector, draft, ..
        } = &mut *state;
        match selector
            .refresh(self.stores.catalogs.as_ref(), &self.defaults, draft)
            .await
        {
            Ok(catalogs) => {
                let count = catalogs.len();
                self.emit(EditorEvent::CatalogsRefreshed { count });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "catalog refresh failed");
                self.notify(Notification::error(LOAD_FAILED));
                Err(err.into())
            }
        }
    }

    pub async fn draft(&self) -> Option<Arc<CatalogRecord>> {
        self.state.lock().await.draft.current()
    }

    pub async fn catalogs(&self) -> Vec<CatalogRecord> {
        self.state.lock().await.selector.catalogs().to_vec()
    }

    pub async fn projects(&self) -> Vec<FunnelProjectSummary> {
        self.state.lock().await.projects.clone()
    }

    pub async fn select(&self, catalog_id: &CatalogId) -> Result<Arc<CatalogRecord>, EditorError> {
        let mut state = self.ready_state().await?;
        let EditorState {
            selector, draft, ..
        } = &mut *state;
        selector.select(catalog_id, draft)?;
        draft.current().ok_or(EditorError::NoDraft)
    }

    pub async fn set_field(&self, key: &str, value: Value) -> Result<Arc<CatalogRecord>, EditorError> {
        self.ready_state().await?.draft.set_field(key, value)
    }

    pub async fn toggle_visible_project(
        &self,
        project_id: &ProjectId,
        visible: bool,
    ) -> Result<Arc<CatalogRecord>, EditorError> {
        self.ready_state()
            .await?
            .draft
            .toggle_visible_project(project_id, visible)
    }

    /// Saves the active draft. A second call while one is running is rejected.
    pub async fn save(&self) -> Result<SaveOutcome, EditorError> {
        let Some(_guard) = self.save_gate.try_begin() else {
            warn!("save rejected: another save is in flight");
            return Err(EditorError::SaveInFlight);
        };
        let mut state = self.ready_state().await?;
        let current = state.draft.current().ok_or(EditorError::NoDraft)?;

        let outcome = match persistence::write_draft(self.stores.catalogs.as_ref(), &current).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, catalog_id = ?current.id, "save failed");
                self.notify(Notification::error(SAVE_FAILED));
                return Err(err.into());
            }
        };
        if let SaveOutcome::Created { record } = &outcome {
            let EditorState {
                selector, draft, ..
            } = &mut *state;
            persistence::adopt_created(
                self.stores.catalogs.as_ref(),
                &self.defaults,
                selector,
                draft,
                record,
            )
            .await;
        }
        drop(state);

        let name = current.name().unwrap_or_default();
        self.notify(Notification::success(format!("Catalog \"{name}\" saved.")));
        Ok(outcome)
    }

    /// Copies the active persisted catalog and makes the copy active.
    pub async fn duplicate(&self) -> Result<CatalogRecord, EditorError> {
        let mut state = self.ready_state().await?;
        let current = state.draft.current().ok_or(EditorError::NoDraft)?;
        let payload = duplicate_payload(&current).ok_or(EditorError::NotPersisted)?;

        let created =
            match persistence::create_from_payload(self.stores.catalogs.as_ref(), &payload).await {
                Ok(created) => created,
                Err(err) => {
                    warn!(error = %err, source_id = ?current.id, "duplicate failed");
                    self.notify(Notification::error(DUPLICATE_FAILED));
                    return Err(err.into());
                }
            };
        let EditorState {
            selector, draft, ..
        } = &mut *state;
        persistence::adopt_created(
            self.stores.catalogs.as_ref(),
            &self.defaults,
            selector,
            draft,
            &created,
        )
        .await;
        drop(state);

        let name = created.name().unwrap_or_default();
        self.notify(Notification::success(format!("Catalog \"{name}\" created.")));
        Ok(created)
    }

    /// Submits the creation dialog and activates the new catalog.
    pub async fn create_catalog(
        &self,
        dialog: &mut CreationDialog,
    ) -> Result<CatalogRecord, EditorError> {
        let mut state = self.ready_state().await?;
        let name = dialog.name.clone();
        let created = match dialog.submit(self.stores.catalogs.as_ref()).await {
            Ok(created) => created,
            Err(EditorError::Validation(message)) => {
                self.notify(Notification::error(message.clone()));
                return Err(EditorError::Validation(message));
            }
            Err(err) => {
                warn!(error = %err, "catalog creation failed");
                self.notify(Notification::error(CREATE_FAILED));
                return Err(err);
            }
        };
        let EditorState {
            selector, draft, ..
        } = &mut *state;
        persistence::adopt_created(
            self.stores.catalogs.as_ref(),
            &self.defaults,
            selector,
            draft,
            &created,
        )
        .await;
        drop(state);

        self.notify(Notification::success(format!("Catalog \"{name}\" created.")));
        Ok(created)
    }

    /// Uploads an image and stores the returned URL in `field`.
    pub async fn apply_upload(
        &self,
        field: ImageField,
        uploader: &dyn ImageUploader,
        image: ImageFile,
    ) -> Result<Arc<CatalogRecord>, EditorError> {
        let current_value = {
            let state = self.ready_state().await?;
            let draft = state.draft.current().ok_or(EditorError::NoDraft)?;
            draft
                .field(field.key())
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let url = match uploader
            .upload(field.label(), current_value.as_deref(), image)
            .await
        {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, field = field.key(), "image upload failed");
                self.notify(Notification::error(UPLOAD_FAILED));
                return Err(err.into());
            }
        };
        self.set_field(field.key(), Value::String(url)).await
    }

    pub async fn public_url(&self) -> Option<Url> {
        let draft = self.draft().await?;
        self.links.for_record(&draft)
    }

    pub async fn cta_targets(&self) -> Vec<CtaTargetGroup> {
        cta_targets(&self.state.lock().await.sales_pages)
    }

    pub async fn resolved(&self) -> Option<ResolvedCatalog> {
        let draft = self.draft().await?;
        Some(ResolvedCatalog::resolve(&draft, &self.defaults))
    }

    async fn ready_state(&self) -> Result<MutexGuard<'_, EditorState>, EditorError> {
        let state = self.state.lock().await;
        match state.phase {
            LoadPhase::Ready => Ok(state),
            phase => Err(EditorError::NotReady(phase)),
        }
    }

    async fn set_phase(&self, phase: LoadPhase) {
        self.state.lock().await.phase = phase;
        self.emit(EditorEvent::PhaseChanged(phase));
    }

    fn notify(&self, notification: Notification) {
        self.emit(EditorEvent::Notification(notification));
    }

    fn emit(&self, event: EditorEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
