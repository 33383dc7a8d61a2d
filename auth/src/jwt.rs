//! HS256 token issuing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access tokens are valid for seven days.
const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum JwtKeysError {
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("token subject is not a user id: {0}")]
    Subject(#[source] uuid::Error),
}

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
}

/// Shared signing/verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for the given user.
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtKeysError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(JwtKeysError::Encode)
    }

    /// Verify a token and return the user id from `sub`.
    pub fn verify(&self, token: &str) -> Result<Uuid, JwtKeysError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(JwtKeysError::Decode)?;
        Uuid::parse_str(&data.claims.sub).map_err(JwtKeysError::Subject)
    }
}
