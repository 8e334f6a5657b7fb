use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::jwks::JwksCache;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("no 'kid' in token header")]
    MissingKeyId,
    #[error("key set unavailable: {0}")]
    KeySet(String),
    #[error("invalid UUID in sub claim: {0}")]
    Subject(#[from] uuid::Error),
}

/// Bearer-token claims.
///
/// Supabase issues these standard + custom fields; locally signed HS256
/// tokens carry the same shape. `sub` is the user's UUID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The auth user UUID.
    pub sub: String,
    /// Token expiration (Unix timestamp).
    pub exp: usize,
    /// Token issued-at (Unix timestamp).
    pub iat: Option<usize>,
    pub iss: Option<String>,
    pub email: Option<String>,
    /// Provider role (e.g. "authenticated").
    pub role: Option<String>,
    /// Metadata from the OAuth provider.
    pub user_metadata: Option<UserMetadata>,
}

/// Metadata populated by the OAuth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
}

impl Claims {
    /// The requester identity carried by the token.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Ok(Uuid::parse_str(&self.sub)?)
    }

    /// Best-effort display name from metadata.
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.full_name.clone().or_else(|| m.name.clone()))
    }

    /// Best-effort avatar URL from metadata.
    pub fn avatar_url(&self) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.avatar_url.clone().or_else(|| m.picture.clone()))
    }

    /// Prefer the top-level email, fall back to metadata.
    pub fn user_email(&self) -> Option<String> {
        self.email
            .clone()
            .or_else(|| self.user_metadata.as_ref().and_then(|m| m.email.clone()))
    }
}

/// How bearer tokens are verified: against the provider's published key set,
/// or against a shared HS256 secret.
#[derive(Clone)]
pub enum TokenVerifier {
    Jwks(JwksCache),
    Secret(String),
}

impl TokenVerifier {
    /// Name of the identity provider recorded on users created from tokens.
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Jwks(_) => "supabase",
            Self::Secret(_) => "local",
        }
    }
}

/// Validate a bearer token and return its decoded claims.
pub async fn validate_token(token: &str, verifier: &TokenVerifier) -> Result<Claims, AuthError> {
    match verifier {
        TokenVerifier::Jwks(cache) => cache.validate_token(token).await.map(|td| td.claims),
        TokenVerifier::Secret(secret) => validate_hs256_token(token, secret),
    }
}

/// Validate an HS256 token signed with `secret`.
pub fn validate_hs256_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}
