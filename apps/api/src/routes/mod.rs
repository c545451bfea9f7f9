pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::auth::handlers as auth;
use crate::credits::handlers as credits;
use crate::files::handlers::{self as files, MAX_UPLOAD_BODY_BYTES};
use crate::history::handlers as history;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/v1/auth/signup", post(auth::handle_sign_up))
        .route("/api/v1/auth/signin", post(auth::handle_sign_in))
        .route("/api/v1/auth/refresh", post(auth::handle_refresh))
        .route("/api/v1/auth/signout", post(auth::handle_sign_out))
        .route("/api/v1/auth/session", get(auth::handle_session))
        // Analysis API
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/credits", get(credits::handle_get_credits))
        // History API
        .route("/api/v1/history", get(history::handle_list_history))
        .route(
            "/api/v1/history/:id",
            get(history::handle_get_analysis).delete(history::handle_delete_analysis),
        )
        .route(
            "/api/v1/history/:id/rerun",
            post(history::handle_rerun_analysis),
        )
        // Files API
        .route(
            "/api/v1/files/parse",
            post(files::handle_parse_file)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
        .with_state(state)
}
