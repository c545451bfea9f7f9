//! Client for the auth provider's GoTrue REST API.
//!
//! Sign-up, sign-in, refresh and sign-out are delegated; this service never
//! stores passwords or sessions itself.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a 4xx; `message` is safe to show the user.
    #[error("rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider error (status {status}): {message}")]
    Upstream { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOutcome {
    pub user_id: Option<Uuid>,
    /// True when the provider requires email confirmation before sign-in.
    pub confirmation_required: bool,
}

/// Carried in `AppState` as `Arc<dyn AuthProvider>`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthProviderError>;

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthProviderError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// GoTrue wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct GoTrueMetadata {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: GoTrueMetadata,
}

impl From<GoTrueUser> for SessionUser {
    fn from(user: GoTrueUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    token_type: String,
    user: GoTrueUser,
}

impl From<GoTrueSession> for Session {
    fn from(s: GoTrueSession) -> Self {
        Self {
            access_token: s.access_token,
            refresh_token: s.refresh_token,
            expires_in: s.expires_in,
            token_type: s.token_type,
            user: s.user.into(),
        }
    }
}

/// Sign-up answers with a session when auto-confirm is on, or with the bare
/// user object when email confirmation is pending.
#[derive(Debug, Deserialize)]
struct GoTrueSignUp {
    access_token: Option<String>,
    user: Option<GoTrueUser>,
    id: Option<Uuid>,
}

impl From<GoTrueSignUp> for SignUpOutcome {
    fn from(s: GoTrueSignUp) -> Self {
        Self {
            user_id: s.user.map(|u| u.id).or(s.id),
            confirmation_required: s.access_token.is_none(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueError {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GoTrueClient
// ────────────────────────────────────────────────────────────────────────────

pub struct GoTrueClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    pub fn new(project_url: &str, anon_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key,
        })
    }

    async fn post(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Result<Response, AuthProviderError> {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoTrueError>(&body)
            .ok()
            .and_then(GoTrueError::into_message)
            .unwrap_or(body);

        if status.is_client_error() {
            warn!("Auth provider rejected {path}: {status}");
            Err(AuthProviderError::Rejected {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(AuthProviderError::Upstream {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        });
        let outcome: SignUpOutcome = self
            .post("/signup", None, body)
            .await?
            .json::<GoTrueSignUp>()
            .await?
            .into();

        info!(
            "Signed up user {:?} (confirmation required: {})",
            outcome.user_id, outcome.confirmation_required
        );
        Ok(outcome)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthProviderError> {
        let body = json!({ "email": email, "password": password });
        let session: Session = self
            .post("/token?grant_type=password", None, body)
            .await?
            .json::<GoTrueSession>()
            .await?
            .into();

        info!("User {} signed in", session.user.id);
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthProviderError> {
        let body = json!({ "refresh_token": refresh_token });
        Ok(self
            .post("/token?grant_type=refresh_token", None, body)
            .await?
            .json::<GoTrueSession>()
            .await?
            .into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        self.post("/logout", Some(access_token), json!({})).await?;
        Ok(())
    }
}
