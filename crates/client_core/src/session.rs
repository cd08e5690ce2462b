//! Explicit backend session handle, built once at startup and passed to every store.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::error::ApiError;
use tracing::debug;
use url::Url;

use crate::{error::StoreError, transport::HttpEntityStore, Entity};

pub const DEFAULT_BASE_URL: &str = "https://base44.app";
const APP_ID_HEADER: &str = "X-App-Id";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub app_id: String,
    pub access_token: Option<String>,
    pub requires_auth: bool,
}

#[derive(Clone)]
pub struct AppClient {
    http: Client,
    config: Arc<AppConfig>,
}

impl AppClient {
    /// Validates the session settings and builds the shared HTTP client.
    pub fn connect(config: AppConfig) -> Result<Self, StoreError> {
        let has_token = config
            .access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty());
        if config.requires_auth && !has_token {
            return Err(StoreError::MissingAccessToken {
                app_id: config.app_id,
            });
        }
        if config.base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(config.base_url.to_string()));
        }
        debug!(app_id = %config.app_id, base_url = %config.base_url, "backend session ready");
        Ok(Self {
            http: Client::new(),
            config: Arc::new(config),
        })
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn entity<T: Entity>(&self) -> HttpEntityStore<T> {
        HttpEntityStore::new(self.clone())
    }

    /// `{base_url}/api/apps/{app_id}/{segments...}`
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidBaseUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "apps", self.config.app_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(APP_ID_HEADER, self.config.app_id.as_str());
        match self.config.access_token.as_deref() {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    pub(crate) async fn send_json<R: DeserializeOwned>(
        &self,
        entity: &str,
        request: RequestBuilder,
    ) -> Result<R, StoreError> {
        let transport = |source| StoreError::Transport {
            entity: entity.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(StoreError::Rejected {
                entity: entity.to_string(),
                status: status.as_u16(),
                error: ApiError::from_response(status.as_u16(), &text),
            });
        }
        // An empty success body (204) reads as `null`.
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &body
        };
        serde_json::from_slice(body).map_err(|source| StoreError::Decode {
            entity: entity.to_string(),
            source,
        })
    }
}
