//! Access token creation and validation.
//!
//! Tokens are stateless HS256 JWTs; nothing is persisted server-side. The
//! payload carries the subject (email), the caller's authorities, and the
//! display claims injected at issuance (user id and first name).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const SCOPE: &str = "read write";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email, which is the login identifier.
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiry (Unix timestamp).
    pub exp: i64,
    pub scope: String,
    /// Granted role names, e.g. "ROLE_OPERATOR".
    pub authorities: Vec<String>,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "userFirstName")]
    pub user_first_name: String,
}

impl Claims {
    pub fn new(
        email: impl Into<String>,
        authorities: Vec<String>,
        user_id: i64,
        user_first_name: impl Into<String>,
        duration_secs: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: email.into(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(duration_secs)).timestamp(),
            scope: SCOPE.to_string(),
            authorities,
            user_id,
            user_first_name: user_first_name.into(),
        }
    }

    #[must_use]
    pub fn has_any_authority(&self, required: &[&str]) -> bool {
        self.authorities
            .iter()
            .any(|a| required.contains(&a.as_str()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::from)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}
