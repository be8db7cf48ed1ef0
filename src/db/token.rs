//! Verification token repository for gatehouse.
//!
//! One table backs both email verification and password reset tokens: at most
//! one live token exists per user (enforced by a unique constraint on
//! `user_id` in addition to the delete-then-insert supersession in
//! [`TokenRepository::replace_for_user`]).
//!
//! A row's existence is necessary but not sufficient for validity: the signed
//! token string carries its own expiry and signature, which the token codec
//! checks independently of the stored expiry.

use chrono::{DateTime, Utc};

use super::DbPool;
use crate::Result;

/// Timestamp format used for the `expires_at` column.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored verification / reset token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    /// Token row ID.
    pub id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Opaque signed token string.
    pub token: String,
    /// Stored expiry timestamp.
    pub expires_at: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl VerificationToken {
    /// Whether the stored expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match chrono::NaiveDateTime::parse_from_str(&self.expires_at, TS_FORMAT) {
            Ok(exp) => exp.and_utc() <= now,
            // Unparseable expiry is treated as expired
            Err(_) => true,
        }
    }
}

/// New token for creation.
#[derive(Debug, Clone)]
pub struct NewVerificationToken {
    /// Owning user ID.
    pub user_id: i64,
    /// Opaque signed token string.
    pub token: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl NewVerificationToken {
    /// Create a token record expiring at `expires_at`.
    pub fn new(user_id: i64, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            token: token.into(),
            expires_at,
        }
    }
}

/// Repository for verification token operations.
pub struct TokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a token for a user, superseding any prior one.
    ///
    /// Delete-then-insert: an outstanding token for the same user is removed
    /// first, so older links stop matching a stored row and report as invalid.
    pub async fn replace_for_user(&self, new_token: &NewVerificationToken) -> Result<VerificationToken> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(new_token.user_id)
            .execute(&mut *tx)
            .await?;

        let token = sqlx::query_as::<_, VerificationToken>(
            "INSERT INTO verification_tokens (user_id, token, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, token, expires_at, created_at",
        )
        .bind(new_token.user_id)
        .bind(&new_token.token)
        .bind(new_token.expires_at.format(TS_FORMAT).to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(token)
    }

    /// Find the stored token row matching both user and token string.
    ///
    /// A well-signed token whose row is absent has been superseded or already
    /// consumed.
    pub async fn find_by_user_and_token(
        &self,
        user_id: i64,
        token: &str,
    ) -> Result<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationToken>(
            "SELECT id, user_id, token, expires_at, created_at
             FROM verification_tokens WHERE user_id = $1 AND token = $2",
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Find the (at most one) stored token for a user.
    pub async fn find_by_user(&self, user_id: i64) -> Result<Option<VerificationToken>> {
        let row = sqlx::query_as::<_, VerificationToken>(
            "SELECT id, user_id, token, expires_at, created_at
             FROM verification_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete any stored token for a user. Returns the number of rows removed,
    /// so callers can use delete-then-act ordering as a consumption guard.
    pub async fn delete_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
