use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("app {app_id} requires authentication but no access token is configured")]
    MissingAccessToken { app_id: String },
    #[error("backend url {0} cannot carry a path")]
    InvalidBaseUrl(String),
    #[error("request for {entity} failed: {source}")]
    Transport {
        entity: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{entity} request rejected with status {status}: {error}")]
    Rejected {
        entity: String,
        status: u16,
        error: ApiError,
    },
    #[error("failed to decode {entity} response: {source}")]
    Decode {
        entity: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("upload response did not include a file url")]
    MissingFileUrl,
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::MissingAccessToken { .. })
            || matches!(self.status(), Some(401) | Some(403))
    }
}
