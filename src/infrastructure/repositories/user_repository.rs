//! User Repository Implementation
//!
//! PostgreSQL projections over the externally-owned `users` table. The core
//! reads display and push-routing fields and writes presence transitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{PushTarget, UserRepository, UserStatus, UserSummary};
use crate::shared::error::AppError;

/// PostgreSQL user repository implementation.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Creates a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    name: String,
    photo_url: String,
}

impl SummaryRow {
    fn into_summary(self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name,
            photo_url: self.photo_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PushTargetRow {
    id: Uuid,
    status: String,
    device_token: Option<String>,
}

impl PushTargetRow {
    fn into_push_target(self) -> PushTarget {
        PushTarget {
            id: self.id,
            status: UserStatus::from_str(&self.status),
            device_token: self.device_token,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_summary(&self, id: Uuid) -> Result<Option<UserSummary>, AppError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, name, photo_url
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_summary()))
    }

    async fn find_push_target(&self, id: Uuid) -> Result<Option<PushTarget>, AppError> {
        let row = sqlx::query_as::<_, PushTargetRow>(
            r#"
            SELECT id, status, device_token
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_push_target()))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
        last_online: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET status = $2, last_online = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(last_online)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_device_token(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET device_token = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
