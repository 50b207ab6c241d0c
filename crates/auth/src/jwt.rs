//! HS256 bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use spendtrack_core::UserId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

/// Verifies a bearer token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to sign token: {0}")]
pub struct TokenIssueError(String);

/// HMAC-SHA256 validator.
///
/// Signature checks are delegated to `jsonwebtoken`; the time window is checked
/// by [`validate_claims`] against the caller-supplied `now`.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Invalid(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

/// HMAC-SHA256 token issuer with a fixed lifetime.
pub struct Hs256JwtIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256JwtIssuer {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(&secret),
            ttl,
        }
    }

    pub fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<String, TokenIssueError> {
        let claims = JwtClaims::new(sub, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| TokenIssueError(e.to_string()))
    }
}
