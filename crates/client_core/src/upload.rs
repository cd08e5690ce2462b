//! Image upload collaborator: hands a file to the backend and returns a stable URL.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::StoreError, session::AppClient};

const UPLOAD_SCOPE: &str = "UploadFile";

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// `label` names the slot being filled and `current_value` is the URL it replaces.
    async fn upload(
        &self,
        label: &str,
        current_value: Option<&str>,
        image: ImageFile,
    ) -> Result<String, StoreError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    file_url: Option<String>,
}

pub struct HttpImageUploader {
    client: AppClient,
}

impl HttpImageUploader {
    pub fn new(client: AppClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
    async fn upload(
        &self,
        label: &str,
        current_value: Option<&str>,
        image: ImageFile,
    ) -> Result<String, StoreError> {
        let url = self
            .client
            .endpoint(&["integration-endpoints", "Core", UPLOAD_SCOPE])?;
        debug!(
            label,
            filename = %image.filename,
            size_bytes = image.bytes.len(),
            replacing = current_value.is_some(),
            "uploading image"
        );

        let mut part = Part::bytes(image.bytes).file_name(image.filename);
        if let Some(mime) = image.mime_type.as_deref() {
            part = part.mime_str(mime).map_err(|source| StoreError::Transport {
                entity: UPLOAD_SCOPE.to_string(),
                source,
            })?;
        }
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .client
            .send_json(
                UPLOAD_SCOPE,
                self.client.request(Method::POST, url).multipart(form),
            )
            .await?;
        let file_url = response
            .file_url
            .filter(|url| !url.is_empty())
            .ok_or(StoreError::MissingFileUrl)?;
        info!(label, file_url = %file_url, "image uploaded");
        Ok(file_url)
    }
}
