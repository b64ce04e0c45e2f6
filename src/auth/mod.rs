//! Authentication: registration/login against the store, token lifecycle.
//!
//! Registration reconciles pre-existing rows by email: a demo-seeded student
//! without a login account gets linked to the new user instead of duplicated,
//! and an account that already has a linked student is rejected.

pub mod jwt;
pub mod password;

use chrono::Duration;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::model::{Id, User};
use crate::store::{Store, StoreError};

pub use jwt::{JwtKeys, TokenPair, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email required.")]
    EmailRequired,
    #[error("User already exists.")]
    AlreadyExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.into())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a login account plus linked student record.
pub fn register(
    store: &Store,
    full_name: &str,
    email: &str,
    raw_password: &str,
) -> Result<User, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AuthError::EmailRequired);
    }
    let name = full_name.trim();

    let user = store.user_by_email(&email);
    let student = store.student_by_email(&email);

    match (user, student) {
        // Both exist and are connected: nothing to register.
        (Some(user), Some(student)) if student.user_id == Some(user.id) => {
            Err(AuthError::AlreadyExists)
        }
        // Account without a student row (or with an unlinked one): attach.
        (Some(user), Some(student)) => {
            store.link_student(student.id, user.id, name)?;
            Ok(user)
        }
        (Some(user), None) => {
            store.create_student(name, &email, Some(user.id));
            Ok(user)
        }
        // No account yet: create it and link or create the student row.
        (None, existing_student) => {
            let hash = password::hash_password(raw_password)?;
            let user = match store.create_user(&email, name, hash) {
                Ok(user) => user,
                Err(StoreError::DuplicateEmail) => return Err(AuthError::AlreadyExists),
                Err(err) => return Err(err.into()),
            };
            match existing_student {
                Some(student) => store.link_student(student.id, user.id, name)?,
                None => {
                    store.create_student(name, &email, Some(user.id));
                }
            }
            Ok(user)
        }
    }
}

pub fn login(store: &Store, email: &str, raw_password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    let user = store
        .user_by_email(&email)
        .ok_or(AuthError::InvalidCredentials)?;
    if !password::verify_password(raw_password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

pub fn token_pair_for(keys: &JwtKeys, config: &AuthConfig, user: &User) -> Result<TokenPair, AuthError> {
    let pair = keys.issue_pair(
        user,
        Duration::minutes(config.access_ttl_mins),
        Duration::days(config.refresh_ttl_days),
    )?;
    Ok(pair)
}

/// Exchange a refresh token for a fresh pair. Rotates: the presented token's
/// jti is revoked, so it cannot be replayed.
pub fn refresh(
    store: &Store,
    keys: &JwtKeys,
    config: &AuthConfig,
    refresh_token: &str,
) -> Result<TokenPair, AuthError> {
    let claims = keys
        .validate(refresh_token, TOKEN_TYPE_REFRESH)
        .map_err(|_| AuthError::InvalidRefreshToken)?;
    if store.is_revoked(&claims.jti) {
        return Err(AuthError::InvalidRefreshToken);
    }
    let user_id: Id = claims
        .sub
        .parse()
        .map_err(|_| AuthError::InvalidRefreshToken)?;
    let user = store
        .user_by_id(user_id)
        .ok_or(AuthError::InvalidRefreshToken)?;

    store.revoke_token(&claims.jti);
    token_pair_for(keys, config, &user)
}

/// Best-effort revocation of a refresh token; invalid tokens are ignored.
pub fn logout(store: &Store, keys: &JwtKeys, refresh_token: &str) {
    if let Ok(claims) = keys.validate(refresh_token, TOKEN_TYPE_REFRESH) {
        store.revoke_token(&claims.jti);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Store, JwtKeys, AuthConfig) {
        (
            Store::new(),
            JwtKeys::from_secret("unit-test-secret"),
            AuthConfig::default(),
        )
    }

    #[test]
    fn register_creates_linked_student() {
        let (store, _, _) = setup();
        let user = register(&store, "Ada Lovelace", "Ada@Example.com ", "pw").unwrap();
        assert_eq!(user.email, "ada@example.com");
        let student = store.student_for_user(user.id).unwrap();
        assert_eq!(student.name, "Ada Lovelace");
        assert_eq!(student.email, "ada@example.com");
    }

    #[test]
    fn register_links_preexisting_student_row() {
        let (store, _, _) = setup();
        let seeded = store.create_student("Ananya", "ananya@example.com", None);
        let user = register(&store, "Ananya S", "ananya@example.com", "pw").unwrap();
        let linked = store.student_for_user(user.id).unwrap();
        assert_eq!(linked.id, seeded.id);
        assert_eq!(linked.name, "Ananya S");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (store, _, _) = setup();
        register(&store, "A", "a@example.com", "pw").unwrap();
        assert!(matches!(
            register(&store, "A", "a@example.com", "pw"),
            Err(AuthError::AlreadyExists)
        ));
    }

    #[test]
    fn empty_email_is_rejected() {
        let (store, _, _) = setup();
        assert!(matches!(
            register(&store, "A", "   ", "pw"),
            Err(AuthError::EmailRequired)
        ));
    }

    #[test]
    fn login_checks_password() {
        let (store, _, _) = setup();
        register(&store, "A", "a@example.com", "right").unwrap();
        assert!(login(&store, "a@example.com", "right").is_ok());
        assert!(matches!(
            login(&store, "a@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "nobody@example.com", "right"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn refresh_rotates_and_revokes() {
        let (store, keys, config) = setup();
        let user = register(&store, "A", "a@example.com", "pw").unwrap();
        let pair = token_pair_for(&keys, &config, &user).unwrap();

        let rotated = refresh(&store, &keys, &config, &pair.refresh).unwrap();
        assert_ne!(rotated.refresh, pair.refresh);

        // The old refresh token is now revoked.
        assert!(matches!(
            refresh(&store, &keys, &config, &pair.refresh),
            Err(AuthError::InvalidRefreshToken)
        ));
        // The rotated one still works.
        assert!(refresh(&store, &keys, &config, &rotated.refresh).is_ok());
    }

    #[test]
    fn logout_revokes_refresh_token() {
        let (store, keys, config) = setup();
        let user = register(&store, "A", "a@example.com", "pw").unwrap();
        let pair = token_pair_for(&keys, &config, &user).unwrap();
        logout(&store, &keys, &pair.refresh);
        assert!(matches!(
            refresh(&store, &keys, &config, &pair.refresh),
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn access_token_cannot_refresh() {
        let (store, keys, config) = setup();
        let user = register(&store, "A", "a@example.com", "pw").unwrap();
        let pair = token_pair_for(&keys, &config, &user).unwrap();
        assert!(matches!(
            refresh(&store, &keys, &config, &pair.access),
            Err(AuthError::InvalidRefreshToken)
        ));
    }
}
