//! Authentication extractor for Axum.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::token::{bearer_token, AuthUser};
use crate::errors::AppError;
use crate::state::AppState;

/// Rejects the request with 401 unless it carries a valid access token.
#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
        else {
            warn!("Authentication failed: missing Authorization header");
            return Err(AppError::Unauthorized);
        };

        match state.tokens.verify(token) {
            Ok(user) => {
                debug!(user_id = %user.id, "Authenticated request");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Access token validation failed");
                Err(AppError::Unauthorized)
            }
        }
    }
}
