use client_core::StoreError;
use shared::domain::CatalogId;
use thiserror::Error;

use crate::{defaults::DefaultsMismatch, events::LoadPhase};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor is not ready (phase: {0:?})")]
    NotReady(LoadPhase),
    #[error("no catalog draft is loaded")]
    NoDraft,
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("catalog has not been saved yet")]
    NotPersisted,
    #[error("catalog {0} not found")]
    NotFound(CatalogId),
    #[error("field {0} is assigned by the backend and cannot be edited")]
    ServerManagedField(String),
    #[error("{0}")]
    Validation(String),
    #[error("public origin {0} cannot be used as a link base")]
    InvalidPublicOrigin(String),
    #[error(transparent)]
    DefaultsMismatch(#[from] DefaultsMismatch),
    #[error(transparent)]
    Store(#[from] StoreError),
}
