//! Verification of access tokens issued by the auth provider.
//!
//! Tokens are HS256 JWTs signed with the project secret, audience
//! `authenticated`, subject = user id.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const JWT_AUDIENCE: &str = "authenticated";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,

    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token subject is not a user id")]
    BadSubject,
}

/// The authenticated caller, decoded from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// The raw access token, needed to revoke the session on sign-out.
    pub access_token: String,
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[JWT_AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::BadSubject)?;

        Ok(AuthUser {
            id,
            email: claims.email,
            full_name: claims.user_metadata.full_name,
            access_token: token.to_string(),
        })
    }
}

/// Extracts the token from an `Authorization` header value.
/// Accepts `Bearer <token>` or a bare token.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim_start();
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();
    (!token.is_empty()).then_some(token)
}
