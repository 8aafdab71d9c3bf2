//! # Bearer Tokens
//!
//! Issues and validates the HS256 JWTs handed out by the login flow. The token
//! carries the username as its subject and expires a fixed number of minutes
//! after issuance.

use crate::CoreAccessError;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default token lifetime.
pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 60;

/// Represents the claims we expect to find in the JWT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// The subject of the token: the username it was issued to.
    pub sub: String,
    /// Issued-at timestamp (seconds since the epoch).
    pub iat: usize,
    /// The expiration timestamp.
    pub exp: usize,
}

/// The body returned by the token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issues a signed token for `subject`, expiring `ttl` from now.
    pub fn issue(&self, subject: &str) -> Result<AccessToken, CoreAccessError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Checks the signature and expiry of `token` and returns its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, CoreAccessError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        // `Validation::default()` allows some leeway on `exp`; hold the line on the
        // exact expiry instead.
        let now = Utc::now().timestamp() as usize;
        if token_data.claims.exp < now {
            return Err(CoreAccessError::InvalidToken(
                jsonwebtoken::errors::ErrorKind::ExpiredSignature.into(),
            ));
        }

        Ok(token_data.claims)
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_minutes", &self.ttl.num_minutes())
            .finish_non_exhaustive()
    }
}
