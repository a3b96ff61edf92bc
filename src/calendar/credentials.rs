use crate::error::{Result, TravelError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, info};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Access grant for the calendar API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Expired, or expiring within the next minute
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|expires| expires <= now + Duration::seconds(60))
            .unwrap_or(false)
    }
}

/// Source of calendar credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Current credential, renewed first if it has expired
    async fn get_valid_credential(&self) -> Result<Credential>;

    /// Force a renewal, e.g. after the API rejected the current token
    async fn refresh(&self) -> Result<Credential>;
}

/// Credentials held in memory; used in tests and for short-lived tokens
#[derive(Debug)]
pub struct InMemoryCredentialProvider {
    current: Mutex<Credential>,
    renewals: Mutex<Vec<Credential>>,
}

impl InMemoryCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self {
            current: Mutex::new(credential),
            renewals: Mutex::new(Vec::new()),
        }
    }

    /// Queue a credential handed out by the next `refresh` call
    pub fn with_renewal(self, credential: Credential) -> Self {
        if let Ok(mut renewals) = self.renewals.lock() {
            renewals.push(credential);
        }
        self
    }

    fn lock_error() -> TravelError {
        TravelError::Auth("credential store is unavailable".to_string())
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialProvider {
    async fn get_valid_credential(&self) -> Result<Credential> {
        let credential = self
            .current
            .lock()
            .map_err(|_| Self::lock_error())?
            .clone();
        if credential.is_expired(Utc::now()) {
            return self.refresh().await;
        }
        Ok(credential)
    }

    async fn refresh(&self) -> Result<Credential> {
        let next = {
            let mut renewals = self.renewals.lock().map_err(|_| Self::lock_error())?;
            if renewals.is_empty() {
                return Err(TravelError::Auth(
                    "no renewable credential available".to_string(),
                ));
            }
            renewals.remove(0)
        };
        *self.current.lock().map_err(|_| Self::lock_error())? = next.clone();
        Ok(next)
    }
}

/// Grant persisted on disk between runs, written by the out-of-band
/// authorization flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredGrant {
    #[serde(flatten)]
    pub credential: Credential,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Reads the grant from a JSON file and renews it with the refresh-token flow
#[derive(Debug)]
pub struct FileCredentialProvider {
    path: PathBuf,
    http: reqwest::Client,
}

impl FileCredentialProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Use `TRIP_PLANNER_CREDENTIALS`, falling back to `token.json`
    pub fn from_env() -> Self {
        let path = std::env::var("TRIP_PLANNER_CREDENTIALS")
            .unwrap_or_else(|_| "token.json".to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoredGrant> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            TravelError::Auth(format!(
                "no stored calendar authorization at {} ({}); complete the authorization flow first",
                self.path.display(),
                err
            ))
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            TravelError::Auth(format!(
                "stored authorization at {} is invalid at {}: {}",
                self.path.display(),
                err.path(),
                err.inner()
            ))
        })
    }

    fn store(&self, grant: &StoredGrant) -> Result<()> {
        let raw = serde_json::to_string_pretty(grant)?;
        std::fs::write(&self.path, raw)?;
        debug!(target: "trip_planner::calendar", path = %self.path.display(), "stored renewed grant");
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialProvider {
    async fn get_valid_credential(&self) -> Result<Credential> {
        let grant = self.load()?;
        if grant.credential.is_expired(Utc::now()) {
            return self.refresh().await;
        }
        Ok(grant.credential)
    }

    async fn refresh(&self) -> Result<Credential> {
        let mut grant = self.load()?;
        let refresh_token = grant.credential.refresh_token.clone().ok_or_else(|| {
            TravelError::Auth("stored authorization has no refresh token".to_string())
        })?;

        let response = self
            .http
            .post(&grant.token_uri)
            .form(&[
                ("client_id", grant.client_id.as_str()),
                ("client_secret", grant.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|err| TravelError::Auth(format!("token refresh failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TravelError::Auth(format!(
                "token refresh rejected with HTTP {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| TravelError::Auth(format!("invalid token response: {err}")))?;

        grant.credential.access_token = token.access_token;
        grant.credential.expires_at = token
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds));
        if let Some(rotated) = token.refresh_token {
            grant.credential.refresh_token = Some(rotated);
        }

        self.store(&grant)?;
        info!(target: "trip_planner::calendar", "renewed calendar credential");
        Ok(grant.credential)
    }
}
