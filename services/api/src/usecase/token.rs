//! Stateless session tokens: HS256 JWT carrying (user id, email), valid for
//! seven days. No refresh, no revocation — a stale token stays valid until
//! natural expiry.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::TOKEN_TTL_SECS;
use crate::error::ApiError;

/// Session token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id (UUID string).
    pub sub: String,
    pub email: String,
    /// Seconds since epoch.
    pub exp: u64,
}

impl TokenClaims {
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        self.sub.parse().map_err(|_| ApiError::InvalidToken)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Sign a session token for the given identity.
pub fn issue_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, ApiError> {
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_owned(),
        exp: now_secs() + TOKEN_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

/// Validate signature and expiry, returning the embedded claims.
/// Distinguishes an expired token from a malformed or tampered one.
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, ApiError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::ExpiredToken,
        _ => ApiError::InvalidToken,
    })
}
