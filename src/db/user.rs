//! User model and repository for gatehouse.

use super::DbPool;
use crate::Result;

/// User entity representing a registered account.
///
/// Accounts are created unverified; `is_verified` flips to true exactly once,
/// through the email verification flow. The password is only ever mutated by
/// the password reset flow.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Username (unique).
    pub username: String,
    /// Email address (unique).
    pub email: String,
    /// Password hash (Argon2, PHC format).
    pub password: String,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Account creation timestamp.
    pub created_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash (must be pre-hashed).
    pub password: String,
}

impl NewUser {
    /// Create a new user record.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user. Accounts always start unverified.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password, is_verified)
             VALUES ($1, $2, $3, 0)
             RETURNING id, username, email, password, is_verified, created_at",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, is_verified, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, is_verified, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password, is_verified, created_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Mark a user's email as verified.
    pub async fn mark_verified(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET is_verified = 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Replace a user's password hash.
    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_create_user_starts_unverified() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_verified);
        assert!(!user.created_at.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_username_and_email() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("bob", "bob@example.com", "hash"))
            .await
            .unwrap();

        let by_name = repo.find_by_username("bob").await.unwrap();
        assert!(by_name.is_some());

        let by_email = repo.find_by_email("bob@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().username, "bob");

        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
        assert!(repo
            .find_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mark_verified() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("carol", "carol@example.com", "hash"))
            .await
            .unwrap();
        assert!(!user.is_verified);

        repo.mark_verified(user.id).await.unwrap();

        let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.is_verified);
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("dave", "dave@example.com", "old-hash"))
            .await
            .unwrap();

        repo.update_password(user.id, "new-hash").await.unwrap();

        let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password, "new-hash");
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("erin", "erin@example.com", "hash"))
            .await
            .unwrap();

        let err = repo
            .create(&NewUser::new("erin", "other@example.com", "hash"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}
