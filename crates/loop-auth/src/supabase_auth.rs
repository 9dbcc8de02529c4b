//! Supabase GoTrue adapter.
//!
//! Tokens live in the local [`KeyValueStore`] under the provider-owned
//! [`StorageKeys`]; nothing else reads them except the table client, which
//! needs the access token for row-level security.

use crate::session_fsm::RefreshConfig;
use crate::{
    AuthError, AuthProvider, AuthResult, RemoteSession, RemoteUser, SignUpMetadata, SignUpOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use loop_storage::{KeyValueStore, StorageError, StorageKeys};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpData<'a> {
    full_name: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token grant response (password, refresh, and sign-up with autoconfirm).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserResponse> for RemoteUser {
    fn from(user: UserResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Token metadata persisted next to the tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionMeta {
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    expires_at: DateTime<Utc>,
}

impl SessionMeta {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) <= now
    }
}

/// [`AuthProvider`] over the Supabase auth REST API.
pub struct SupabaseAuth {
    store: Arc<dyn KeyValueStore>,
    supabase_url: String,
    anon_key: String,
    http_client: Client,
    refresh_config: RefreshConfig,
}

impl SupabaseAuth {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        supabase_url: &str,
        anon_key: &str,
    ) -> AuthResult<Self> {
        Self::with_refresh_config(store, supabase_url, anon_key, RefreshConfig::default())
    }

    pub fn with_refresh_config(
        store: Arc<dyn KeyValueStore>,
        supabase_url: &str,
        anon_key: &str,
        refresh_config: RefreshConfig,
    ) -> AuthResult<Self> {
        Url::parse(supabase_url)?;
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            store,
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http_client,
            refresh_config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path)
    }

    fn stored_meta(&self) -> AuthResult<Option<SessionMeta>> {
        match self.store.get(StorageKeys::SUPABASE_SESSION_META)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn store_tokens(&self, data: &TokenResponse) -> AuthResult<()> {
        let meta = SessionMeta {
            user_id: data.user.id.clone(),
            email: data.user.email.clone(),
            expires_at: Utc::now() + ChronoDuration::seconds(data.expires_in),
        };
        self.store
            .set(StorageKeys::SUPABASE_ACCESS_TOKEN, &data.access_token)?;
        self.store
            .set(StorageKeys::SUPABASE_REFRESH_TOKEN, &data.refresh_token)?;
        let meta_json =
            serde_json::to_string(&meta).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.store
            .set(StorageKeys::SUPABASE_SESSION_META, &meta_json)?;
        Ok(())
    }

    fn clear_tokens(&self) -> AuthResult<()> {
        self.store.delete(StorageKeys::SUPABASE_ACCESS_TOKEN)?;
        self.store.delete(StorageKeys::SUPABASE_REFRESH_TOKEN)?;
        self.store.delete(StorageKeys::SUPABASE_SESSION_META)?;
        Ok(())
    }

    /// Ask the server who owns `access_token`. `None` when it is rejected.
    async fn fetch_user(&self, access_token: &str) -> AuthResult<Option<RemoteUser>> {
        let url = self.endpoint("user");
        debug!(url = %url, "Verifying session with Supabase");

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "Server rejected session");
            return Ok(None);
        }

        let user: UserResponse = response.error_for_status()?.json().await?;
        Ok(Some(user.into()))
    }

    async fn refresh_with_backoff(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let mut last_error = None;

        for attempt in 0..self.refresh_config.max_retries {
            match self.try_refresh(refresh_token).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_transient() => {
                    last_error = Some(e);
                    if attempt + 1 < self.refresh_config.max_retries {
                        let delay = self.refresh_config.delay_for_attempt(attempt);
                        debug!(
                            attempt = attempt + 1,
                            max_retries = self.refresh_config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Refresh failed with transient error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            "Refresh failed after {} attempts",
            self.refresh_config.max_retries
        );
        Err(last_error.unwrap_or(AuthError::RefreshExhausted(
            self.refresh_config.max_retries,
        )))
    }

    async fn try_refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let url = self.endpoint("token?grant_type=refresh_token");
        debug!(url = %url, "Refreshing token");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if response.status().is_client_error() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(AuthError::TokenRefresh(format!("HTTP {}: {}", status, message)));
        }

        let data: TokenResponse = response.error_for_status()?.json().await?;
        self.store_tokens(&data)?;
        info!(user_id = %data.user.id, "Token refreshed successfully");
        Ok(data)
    }

    /// Exchange the stored refresh token for a new session, retrying
    /// transient failures with exponential backoff.
    ///
    /// `Ok(None)` when there is no refresh token or the server rejects it;
    /// the stored tokens are cleared in the latter case.
    pub async fn refresh_session(&self) -> AuthResult<Option<RemoteSession>> {
        let Some(refresh_token) = self.store.get(StorageKeys::SUPABASE_REFRESH_TOKEN)? else {
            return Ok(None);
        };
        match self.refresh_with_backoff(&refresh_token).await {
            Ok(data) => {
                let expires_at = self.stored_meta()?.map(|m| m.expires_at);
                Ok(Some(RemoteSession {
                    user: data.user.into(),
                    expires_at,
                }))
            }
            Err(AuthError::TokenRefresh(msg)) => {
                warn!(error = %msg, "Refresh token rejected, clearing session");
                self.clear_tokens()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Current access token, if any. Used to authorise table requests.
    pub fn access_token(&self) -> AuthResult<Option<String>> {
        Ok(self.store.get(StorageKeys::SUPABASE_ACCESS_TOKEN)?)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn get_session(&self) -> AuthResult<Option<RemoteSession>> {
        let Some(mut access_token) = self.store.get(StorageKeys::SUPABASE_ACCESS_TOKEN)? else {
            return Ok(None);
        };
        let Some(mut meta) = self.stored_meta()? else {
            warn!("Access token without metadata, discarding");
            self.clear_tokens()?;
            return Ok(None);
        };

        if meta.is_expired(Utc::now()) {
            let Some(refresh_token) = self.store.get(StorageKeys::SUPABASE_REFRESH_TOKEN)? else {
                self.clear_tokens()?;
                return Ok(None);
            };
            // One attempt only: a transient failure goes straight back to the
            // caller, which decides from its cache.
            info!("Token expired, attempting refresh");
            match self.try_refresh(&refresh_token).await {
                Ok(data) => {
                    access_token = data.access_token;
                    meta = self.stored_meta()?.unwrap_or(meta);
                }
                Err(AuthError::TokenRefresh(msg)) => {
                    warn!(error = %msg, "Refresh token rejected, clearing session");
                    self.clear_tokens()?;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        match self.fetch_user(&access_token).await? {
            Some(user) => {
                debug!(user_id = %user.id, "Session verified with server");
                Ok(Some(RemoteSession {
                    user,
                    expires_at: Some(meta.expires_at),
                }))
            }
            None => {
                self.clear_tokens()?;
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<RemoteSession> {
        let url = self.endpoint("token?grant_type=password");
        debug!(url = %url, email = %email, "Attempting email/password login");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordRequest { email, password })
            .send()
            .await?;

        if response.status().is_client_error() {
            let message = error_message(response).await;
            return Err(AuthError::InvalidCredentials(message));
        }

        let data: TokenResponse = response.error_for_status()?.json().await?;
        self.store_tokens(&data)?;
        let expires_at = self.stored_meta()?.map(|m| m.expires_at);

        Ok(RemoteSession {
            user: data.user.into(),
            expires_at,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> AuthResult<SignUpOutcome> {
        let url = self.endpoint("signup");
        debug!(url = %url, email = %email, "Creating account");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpData {
                    full_name: &metadata.full_name,
                },
            })
            .send()
            .await?;

        if response.status().is_client_error() {
            let message = error_message(response).await;
            return Err(AuthError::ValidationFailure(message));
        }

        let body: serde_json::Value = response.error_for_status()?.json().await?;
        if body.get("access_token").is_some() {
            let data: TokenResponse = serde_json::from_value(body)?;
            self.store_tokens(&data)?;
            let user: RemoteUser = data.user.into();
            let expires_at = self.stored_meta()?.map(|m| m.expires_at);
            Ok(SignUpOutcome {
                session: Some(RemoteSession {
                    user: user.clone(),
                    expires_at,
                }),
                user,
            })
        } else {
            // Email confirmation pending: the user exists but has no session yet.
            let user: UserResponse = serde_json::from_value(body)?;
            info!(user_id = %user.id, "Account created, awaiting email confirmation");
            Ok(SignUpOutcome {
                user: user.into(),
                session: None,
            })
        }
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let access_token = self.store.get(StorageKeys::SUPABASE_ACCESS_TOKEN)?;
        self.clear_tokens()?;

        let Some(access_token) = access_token else {
            return Ok(());
        };

        let response = self
            .http_client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        // A token the server no longer knows is already signed out.
        if response.status().is_client_error() {
            debug!(status = %response.status(), "Logout rejected by server");
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }
}

/// Best-effort human message from a GoTrue error body.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(&body).unwrap_or_else(|| format!("HTTP {}", status))
}

fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
