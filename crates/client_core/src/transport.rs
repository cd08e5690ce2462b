//! REST implementation of the entity store traits.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use shared::protocol::{EntitySchema, WritePayload};
use tracing::debug;

use crate::{error::StoreError, session::AppClient, Entity, EntityListing, EntityStore};

pub struct HttpEntityStore<T> {
    client: AppClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> HttpEntityStore<T> {
    pub fn new(client: AppClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Entity> EntityListing<T> for HttpEntityStore<T> {
    async fn list(&self) -> Result<Vec<T>, StoreError> {
        let url = self.client.endpoint(&["entities", T::NAME])?;
        debug!(entity = T::NAME, "listing records");
        let records: Option<Vec<T>> = self
            .client
            .send_json(T::NAME, self.client.request(Method::GET, url))
            .await?;
        Ok(records.unwrap_or_default())
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for HttpEntityStore<T> {
    async fn create(&self, payload: &WritePayload) -> Result<T, StoreError> {
        let url = self.client.endpoint(&["entities", T::NAME])?;
        debug!(entity = T::NAME, fields = payload.0.len(), "creating record");
        self.client
            .send_json(T::NAME, self.client.request(Method::POST, url).json(payload))
            .await
    }

    async fn update(&self, id: &str, payload: &WritePayload) -> Result<Value, StoreError> {
        let url = self.client.endpoint(&["entities", T::NAME, id])?;
        debug!(entity = T::NAME, record_id = id, "updating record");
        self.client
            .send_json(T::NAME, self.client.request(Method::PUT, url).json(payload))
            .await
    }

    async fn schema(&self) -> Result<EntitySchema, StoreError> {
        let url = self.client.endpoint(&["entities", T::NAME, "schema"])?;
        self.client
            .send_json(T::NAME, self.client.request(Method::GET, url))
            .await
    }
}
