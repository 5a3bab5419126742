/*
 * Responsibility
 * - sessions テーブル向け SQLx 操作
 * - login 時の記録と、users 一覧への relation 取得（batch）
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, FromRow)]
pub struct SessionRow {
    #[sqlx(rename = "sessionId")]
    pub id: Uuid,
    #[sqlx(rename = "userId")]
    pub user_id: Uuid,
    #[sqlx(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
}

pub async fn record_login(db: &PgPool, user_id: Uuid) -> Result<SessionRow, RepoError> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions ("userId")
        VALUES ($1)
        RETURNING "sessionId", "userId", "startedAt"
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Fetch sessions for a set of users in one round trip (no per-user queries).
pub async fn list_for_users(db: &PgPool, user_ids: &[Uuid]) -> Result<Vec<SessionRow>, RepoError> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT "sessionId", "userId", "startedAt"
        FROM sessions
        WHERE "userId" = ANY($1)
        ORDER BY "startedAt" DESC
        "#,
    )
    .bind(user_ids.to_vec())
    .fetch_all(db)
    .await?;

    Ok(rows)
}
