//! JWT issuance and validation (HS256 via `jsonwebtoken`).
//!
//! Access and refresh tokens share one claims shape and differ only in
//! `token_type` and lifetime. Every token carries a `jti` so refresh tokens
//! can be revoked individually (the store keeps the blacklist).

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::User;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// "access" or "refresh".
    pub token_type: String,
    /// Token id, used for refresh revocation.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Wrong token type")]
    WrongType,
}

/// Symmetric key pair derived from the configured secret. Cheap to clone.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn issue(&self, user: &User, token_type: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            token_type: token_type.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding).context("encoding jwt")
    }

    /// Issue a fresh access/refresh pair for a user.
    pub fn issue_pair(
        &self,
        user: &User,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user, TOKEN_TYPE_ACCESS, access_ttl)?,
            refresh: self.issue(user, TOKEN_TYPE_REFRESH, refresh_ttl)?,
        })
    }

    /// Validate signature and expiry, then check the token type.
    pub fn validate(
        &self,
        token: &str,
        expected_type: &str,
    ) -> Result<Claims, TokenValidationError> {
        let validation = Validation::new(JWT_ALGORITHM);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenValidationError::Invalid)?;
        if data.claims.token_type != expected_type {
            return Err(TokenValidationError::WrongType);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            email: "t@example.com".to_string(),
            full_name: "T".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::from_secret("unit-test-secret")
    }

    #[test]
    fn issued_pair_validates_with_matching_types() {
        let keys = keys();
        let pair = keys
            .issue_pair(&user(), Duration::minutes(5), Duration::days(1))
            .unwrap();
        let access = keys.validate(&pair.access, TOKEN_TYPE_ACCESS).unwrap();
        assert_eq!(access.sub, "7");
        assert_eq!(access.email, "t@example.com");
        let refresh = keys.validate(&pair.refresh, TOKEN_TYPE_REFRESH).unwrap();
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let keys = keys();
        let pair = keys
            .issue_pair(&user(), Duration::minutes(5), Duration::days(1))
            .unwrap();
        assert_eq!(
            keys.validate(&pair.access, TOKEN_TYPE_REFRESH),
            Err(TokenValidationError::WrongType)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys();
        let pair = keys
            .issue_pair(&user(), Duration::minutes(-5), Duration::days(1))
            .unwrap();
        assert_eq!(
            keys.validate(&pair.access, TOKEN_TYPE_ACCESS),
            Err(TokenValidationError::Invalid)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let pair = keys()
            .issue_pair(&user(), Duration::minutes(5), Duration::days(1))
            .unwrap();
        let other = JwtKeys::from_secret("different-secret");
        assert_eq!(
            other.validate(&pair.access, TOKEN_TYPE_ACCESS),
            Err(TokenValidationError::Invalid)
        );
    }
}
