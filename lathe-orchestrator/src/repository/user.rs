//! User Repository

use async_trait::async_trait;
use lathe_core::domain::user::{SealedToken, User};
use sqlx::PgPool;

use super::StoreResult;

/// Resource factory for users
#[async_trait]
pub trait UserFactory: Send + Sync {
    async fn get(&self, username: &str) -> StoreResult<Option<User>>;

    /// Create the user, or replace the token of an existing one
    async fn create(&self, username: &str, token: SealedToken) -> StoreResult<User>;
}

/// PostgreSQL implementation of [`UserFactory`]
pub struct PgUserFactory {
    pool: PgPool,
}

impl PgUserFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserFactory for PgUserFactory {
    async fn get(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT username, token FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(username, token)| User::new(username, SealedToken::new(token))))
    }

    async fn create(&self, username: &str, token: SealedToken) -> StoreResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (username, token)
            VALUES ($1, $2)
            ON CONFLICT (username) DO UPDATE SET token = EXCLUDED.token
            "#,
        )
        .bind(username)
        .bind(token.unseal())
        .execute(&self.pool)
        .await?;

        Ok(User::new(username, token))
    }
}
