use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::protocol::{CatalogRecord, EntitySchema, FunnelProjectSummary, SalesPage, WritePayload};

pub mod error;
pub mod session;
pub mod transport;
pub mod upload;

pub use error::StoreError;
pub use session::{AppClient, AppConfig, DEFAULT_BASE_URL};
pub use transport::HttpEntityStore;
pub use upload::{HttpImageUploader, ImageFile, ImageUploader};

/// A record kind exposed by the backend under `entities/{NAME}`.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const NAME: &'static str;
}

impl Entity for CatalogRecord {
    const NAME: &'static str = "Catalog";
}

impl Entity for FunnelProjectSummary {
    const NAME: &'static str = "FunnelProject";
}

impl Entity for SalesPage {
    const NAME: &'static str = "SalesPage";
}

/// Read access to one record kind. The order of `list` is whatever the backend returns.
#[async_trait]
pub trait EntityListing<T: Send + 'static>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, StoreError>;
}

#[async_trait]
pub trait EntityStore<T: Send + 'static>: EntityListing<T> {
    /// The backend assigns the identifier and returns the stored record.
    async fn create(&self, payload: &WritePayload) -> Result<T, StoreError>;
    /// Returns the backend's confirmation body, which is not necessarily a full record.
    async fn update(&self, id: &str, payload: &WritePayload) -> Result<Value, StoreError>;
    async fn schema(&self) -> Result<EntitySchema, StoreError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
