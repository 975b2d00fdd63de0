//! # Workout API Client
//!
//! The network boundary. One call, no retries; the engine decides when to
//! try again.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::auth::CredentialStore;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{SyncWorkoutRequest, SyncWorkoutResponse};

const SYNC_WORKOUT_PATH: &str = "api/workouts/sync";

/// Anything that can deliver a workout to the server.
#[async_trait]
pub trait WorkoutRemote: Send + Sync {
    async fn sync_workout(&self, request: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse>;
}

/// HTTP implementation of [`WorkoutRemote`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    sync_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(config: &SyncConfig, credentials: Arc<dyn CredentialStore>) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(ApiClient {
            http,
            sync_url: endpoint(&config.api.base_url, SYNC_WORKOUT_PATH)?,
            credentials,
        })
    }

    pub fn sync_url(&self) -> &Url {
        &self.sync_url
    }
}

#[async_trait]
impl WorkoutRemote for ApiClient {
    async fn sync_workout(&self, request: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse> {
        let token = self
            .credentials
            .access_token()
            .await?
            .ok_or(SyncError::NotAuthenticated)?;

        debug!(url = %self.sync_url, exercises = request.exercises.len(), "Posting workout");

        let response = self
            .http
            .post(self.sync_url.clone())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::ServerRejected {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.canonical_reason().unwrap_or("unknown").to_string()
                } else {
                    message
                },
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SyncError::DeserializationFailed(e.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("sync_url", &self.sync_url.as_str())
            .finish()
    }
}

/// Joins `path` onto `base`, keeping any path prefix `base` already has.
fn endpoint(base: &str, path: &str) -> SyncResult<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path)?)
}
