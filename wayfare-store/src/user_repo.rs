use async_trait::async_trait;
use sqlx::PgPool;
use wayfare_core::models::{User, UserUpdate};
use wayfare_core::repository::{RepoResult, UserRepository};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: &User) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (github_email, name, registered_at, last_login)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (github_email) DO NOTHING
            "#,
        )
        .bind(&user.github_email)
        .bind(&user.name)
        .bind(user.registered_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_user(&self, update: &UserUpdate) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2,
                registered_at = COALESCE($3, registered_at),
                last_login = COALESCE($4, last_login)
            WHERE github_email = $1
            "#,
        )
        .bind(&update.github_email)
        .bind(&update.name)
        .bind(update.registered_at)
        .bind(update.last_login)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, github_email: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE github_email = $1")
            .bind(github_email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
