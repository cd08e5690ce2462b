//! Editing model for Catalog records: one draft, loaded from and persisted to a
//! remote entity store.

pub mod creation;
pub mod defaults;
pub mod draft;
pub mod duplication;
pub mod editor;
pub mod error;
pub mod events;
pub mod links;
pub mod persistence;
pub mod selector;
pub mod settings;

pub use creation::CreationDialog;
pub use defaults::{CatalogDefaults, DefaultsMismatch, NEW_CATALOG_NAME};
pub use editor::{CommandCenter, ImageField, Stores};
pub use error::EditorError;
pub use events::{EditorEvent, LoadPhase, Notification, NotificationLevel};
pub use links::{CtaTarget, CtaTargetGroup, PublicLinks};
pub use persistence::SaveOutcome;
pub use settings::ResolvedCatalog;
