//! Axum route handlers for the Credits API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::token::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: i32,
}

/// GET /api/v1/credits
pub async fn handle_get_credits(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CreditsResponse>, AppError> {
    let credits = state.credits.balance(user.id).await?;
    Ok(Json(CreditsResponse { credits }))
}
