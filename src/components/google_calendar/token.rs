use crate::error::{auth_error, SyncResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Tokens this close to expiry are refreshed before use
const EXPIRY_SKEW_SECS: i64 = 60;

/// Supplies bearer tokens for the Calendar API
///
/// Implementations either return a currently valid access token, refreshing
/// it first if needed, or fail with an authorization error.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> SyncResult<String>;
}

/// Provider that always hands out the same token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> SyncResult<String> {
        if self.token.is_empty() {
            return Err(auth_error("No access token configured"));
        }
        Ok(self.token.clone())
    }
}

/// Authorized-user credential as cached on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(alias = "token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC3339 expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    /// Unix timestamp expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl StoredCredential {
    /// Expiry instant, if the credential records one
    pub fn expires(&self) -> Option<DateTime<Utc>> {
        if let Some(expiry) = &self.expiry {
            if let Ok(dt) = DateTime::parse_from_rfc3339(expiry) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        self.expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }

    /// Whether the access token can be used at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self
            .access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty());
        if !has_token {
            return false;
        }
        match self.expires() {
            Some(expires) => expires - Duration::seconds(EXPIRY_SKEW_SECS) > now,
            // Tokens without a recorded expiry are trusted until the API rejects them
            None => true,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Record a fresh access token valid for `expires_in` seconds
    pub fn apply_refresh(&mut self, access_token: String, expires_in: i64, now: DateTime<Utc>) {
        let expires = now + Duration::seconds(expires_in);
        self.access_token = Some(access_token);
        self.expiry = Some(expires.to_rfc3339());
        self.expires_at = Some(expires.timestamp());
    }

    pub fn load(path: &Path) -> SyncResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            auth_error(&format!(
                "Failed to read credential file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            auth_error(&format!(
                "Failed to parse credential file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn save(&self, path: &Path) -> SyncResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;

        // Owner-only, the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

/// OAuth client registration, as downloaded from the Google console
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: Option<ClientSecretsBlock>,
    pub web: Option<ClientSecretsBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecretsBlock {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> SyncResult<ClientSecretsBlock> {
        let content = fs::read_to_string(path).map_err(|e| {
            auth_error(&format!(
                "Failed to read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        let secrets: ClientSecrets = serde_json::from_str(&content)?;
        secrets
            .installed
            .or(secrets.web)
            .ok_or_else(|| auth_error("Client secrets contain neither 'installed' nor 'web'"))
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Credential provider backed by a cached token file
///
/// The file is read on first use and rewritten after every refresh.
pub struct FileTokenProvider {
    token_path: PathBuf,
    client_secrets_path: PathBuf,
    token_uri: String,
    scopes: Vec<String>,
    client: Client,
    credential: Mutex<Option<StoredCredential>>,
}

impl FileTokenProvider {
    pub fn new(
        token_path: impl Into<PathBuf>,
        client_secrets_path: impl Into<PathBuf>,
        token_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            token_path: token_path.into(),
            client_secrets_path: client_secrets_path.into(),
            token_uri: token_uri.into(),
            scopes,
            client: Client::new(),
            credential: Mutex::new(None),
        }
    }

    fn load_credential(&self) -> SyncResult<StoredCredential> {
        if !self.token_path.exists() {
            return Err(auth_error(&format!(
                "No credential found at {}",
                self.token_path.display()
            )));
        }
        let credential = StoredCredential::load(&self.token_path)?;

        let missing: Vec<&String> = self
            .scopes
            .iter()
            .filter(|scope| !credential.scopes.is_empty() && !credential.scopes.contains(*scope))
            .collect();
        if !missing.is_empty() {
            warn!("Cached credential does not list scopes {:?}", missing);
        }

        Ok(credential)
    }

    /// Client id and secret for refreshing, from the credential or the secrets file
    fn client_identity(&self, credential: &StoredCredential) -> SyncResult<(String, String)> {
        if let (Some(id), Some(secret)) = (&credential.client_id, &credential.client_secret) {
            return Ok((id.clone(), secret.clone()));
        }
        let secrets = ClientSecrets::load(&self.client_secrets_path)?;
        Ok((secrets.client_id, secrets.client_secret))
    }

    async fn refresh(&self, credential: &mut StoredCredential) -> SyncResult<()> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| auth_error("No refresh token in credential"))?;
        let (client_id, client_secret) = self.client_identity(credential)?;
        let token_uri = credential
            .token_uri
            .clone()
            .unwrap_or_else(|| self.token_uri.clone());

        info!("Refreshing Google Calendar access token");

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(&token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        credential.apply_refresh(refreshed.access_token, refreshed.expires_in, Utc::now());
        // Google usually omits the refresh token on refresh
        if let Some(new_refresh) = refreshed.refresh_token.filter(|t| !t.is_empty()) {
            credential.refresh_token = Some(new_refresh);
        }

        credential.save(&self.token_path)?;
        Ok(())
    }
}

#[async_trait]
impl CredentialProvider for FileTokenProvider {
    async fn access_token(&self) -> SyncResult<String> {
        let mut cached = self.credential.lock().await;

        let mut credential = match cached.take() {
            Some(credential) => credential,
            None => self.load_credential()?,
        };

        if !credential.is_valid_at(Utc::now()) {
            if !credential.can_refresh() {
                return Err(auth_error(
                    "Credential expired and cannot be refreshed",
                ));
            }
            self.refresh(&mut credential).await?;
        }

        let token = credential
            .access_token
            .clone()
            .ok_or_else(|| auth_error("No access token available"))?;
        *cached = Some(credential);
        Ok(token)
    }
}
