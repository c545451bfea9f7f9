//! Axum route handlers for the Auth API.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::provider::{AuthProviderError, Session, SessionUser, SignUpOutcome};
use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/signup
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<SignUpOutcome>, AppError> {
    let email = validate_email(&req.email)?;
    if req.password.is_empty() {
        return Err(AppError::Validation("password cannot be empty".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords don't match".to_string()));
    }
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let outcome = state
        .auth
        .sign_up(email, &req.password, full_name)
        .await
        .map_err(|e| provider_error(e, AppError::Validation))?;

    Ok(Json(outcome))
}

/// POST /api/v1/auth/signin
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<Session>, AppError> {
    let email = validate_email(&req.email)?;

    let session = state
        .auth
        .sign_in(email, &req.password)
        .await
        .map_err(|e| provider_error(e, |_| AppError::Unauthorized))?;

    Ok(Json(session))
}

/// POST /api/v1/auth/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<Session>, AppError> {
    if req.refresh_token.trim().is_empty() {
        return Err(AppError::Validation(
            "refreshToken cannot be empty".to_string(),
        ));
    }

    let session = state
        .auth
        .refresh(req.refresh_token.trim())
        .await
        .map_err(|e| provider_error(e, |_| AppError::Unauthorized))?;

    Ok(Json(session))
}

/// POST /api/v1/auth/signout
pub async fn handle_sign_out(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .sign_out(&user.access_token)
        .await
        .map_err(|e| provider_error(e, |_| AppError::Unauthorized))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
pub async fn handle_session(user: AuthUser) -> Json<SessionUser> {
    Json(SessionUser {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
    })
}

fn validate_email(email: &str) -> Result<&str, AppError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::Validation(
            "a valid email address is required".to_string(),
        )),
    }
}

/// 4xx answers go through `on_rejected`; transport and 5xx failures are upstream errors.
fn provider_error(e: AuthProviderError, on_rejected: impl FnOnce(String) -> AppError) -> AppError {
    match e {
        AuthProviderError::Rejected { message, .. } => on_rejected(message),
        other => AppError::AuthProvider(other.to_string()),
    }
}
