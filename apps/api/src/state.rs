use std::sync::Arc;

use crate::analysis::analyzer::ResumeAnalyzer;
use crate::auth::provider::AuthProvider;
use crate::auth::token::TokenVerifier;
use crate::credits::ledger::CreditLedger;
use crate::history::repository::AnalysisRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Default: `GeminiAnalyzer`.
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    pub analyses: Arc<dyn AnalysisRepository>,
    pub credits: Arc<dyn CreditLedger>,
    /// Sign-up, sign-in, refresh and sign-out are delegated to the hosted auth service.
    pub auth: Arc<dyn AuthProvider>,
    /// Verifies access tokens locally; no round trip per request.
    pub tokens: TokenVerifier,
}
