use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spendtrack_core::UserId;

/// JWT claims model (transport-agnostic).
///
/// Timestamps are serialized as seconds since the epoch (`iat` / `exp`), the
/// registered JWT claim names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    /// Claims for `sub` valid from `now` for `ttl`, truncated to whole seconds.
    pub fn new(sub: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        Self {
            sub,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed or unverifiable token: {0}")]
    Invalid(String),
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn accepts_claims_inside_window() {
        let claims = JwtClaims::new(UserId::new(), t0(), Duration::hours(1));
        assert_eq!(validate_claims(&claims, t0()), Ok(()));
        assert_eq!(validate_claims(&claims, t0() + Duration::minutes(59)), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_claims() {
        let claims = JwtClaims::new(UserId::new(), t0(), Duration::hours(1));
        assert_eq!(
            validate_claims(&claims, t0() + Duration::hours(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, t0() - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn rejects_inverted_window() {
        let claims = JwtClaims::new(UserId::new(), t0(), Duration::zero());
        assert_eq!(validate_claims(&claims, t0()), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn serializes_registered_claim_names() {
        let claims = JwtClaims::new(UserId::new(), t0(), Duration::hours(1));
        let v = serde_json::to_value(&claims).unwrap();
        assert_eq!(v["iat"], serde_json::json!(t0().timestamp()));
        assert_eq!(v["exp"], serde_json::json!(t0().timestamp() + 3600));
        assert_eq!(v["sub"], serde_json::json!(claims.sub.to_string()));
    }
}
