//! Database schema migrations for gatehouse.
//!
//! Migrations are applied in order at startup. Each entry is a single
//! migration step; the applied version is tracked in `schema_version`.

/// All schema migrations, in order.
pub const MIGRATIONS: &[&str] = &[
    // v1: users and verification tokens
    r#"
    CREATE TABLE users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL UNIQUE,
        email       TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        is_verified INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_users_email ON users(email);

    CREATE TABLE verification_tokens (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        token       TEXT NOT NULL,
        expires_at  TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_verification_tokens_token ON verification_tokens(token);
    "#,
];
