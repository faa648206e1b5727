// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration, login, and bearer-token authentication.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, decode_jwt};
use crate::models::user::TokenResponse;
use crate::models::User;
use anyhow::anyhow;
use std::sync::Arc;

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow!("failed to hash password: {}", e)))
}

/// Verify a password against a bcrypt hash on the blocking pool.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow!("password verification task failed: {}", e)))?;

    Ok(verified.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Stored password hash could not be parsed");
        false
    }))
}

/// Emails are compared case-insensitively and stored lower-case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    signing_key: Arc<[u8]>,
    token_ttl_minutes: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(db: Database, secret_key: &str, token_ttl_minutes: i64, bcrypt_cost: u32) -> Self {
        Self {
            db,
            signing_key: Arc::from(secret_key.as_bytes()),
            token_ttl_minutes,
            bcrypt_cost,
        }
    }

    /// Create an account. Fails with `Conflict` if the email is taken.
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let hashed = hash_password(password.to_string(), self.bcrypt_cost).await?;

        // A concurrent registration can still win the race; the unique index
        // turns that into a Conflict too.
        let user = self.db.create_user(&email, &hashed).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict("Email already registered".to_string()),
            other => other,
        })?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let email = normalize_email(email);

        let Some(user) = self.db.get_user_by_email(&email).await? else {
            tracing::info!("Login rejected: unknown email");
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password.to_string(), user.hashed_password.clone()).await? {
            tracing::info!(user_id = user.id, "Login rejected: bad password");
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        let token = create_jwt(user.id, &self.signing_key, self.token_ttl_minutes)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(TokenResponse::bearer(token))
    }

    /// Resolve a bearer token to an active user.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = decode_jwt(token, &self.signing_key)?;

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let db = Database::in_memory().await.unwrap();
        AuthService::new(db, "unit-test-secret", 30, 4)
    }

    #[tokio::test]
    async fn register_normalizes_email_and_rejects_duplicates() {
        let auth = service().await;
        let user = auth.register("  Alice@Example.COM ", "secret1").await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.hashed_password, "secret1");

        let err = auth.register("alice@example.com", "other12").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_then_authenticate() {
        let auth = service().await;
        let user = auth.register("bob@example.com", "hunter22").await.unwrap();

        let token = auth.login("BOB@example.com", "hunter22").await.unwrap();
        assert_eq!(token.token_type, "bearer");

        let resolved = auth.authenticate(&token.access_token).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let auth = service().await;
        auth.register("carol@example.com", "correct-horse").await.unwrap();

        assert!(matches!(
            auth.login("carol@example.com", "wrong").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "whatever").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn inactive_user_is_forbidden() {
        let db = Database::in_memory().await.unwrap();
        let auth = AuthService::new(db.clone(), "unit-test-secret", 30, 4);
        let user = auth.register("dan@example.com", "password").await.unwrap();
        let token = auth.login("dan@example.com", "password").await.unwrap();

        db.set_user_active(user.id, false).await.unwrap();

        assert!(matches!(
            auth.authenticate(&token.access_token).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            auth.login("dan@example.com", "password").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn token_for_missing_user_is_invalid() {
        let auth = service().await;
        let token = create_jwt(999, b"unit-test-secret", 30).unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AppError::InvalidToken)
        ));
    }
}
