use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record or refresh a creator identity. First write wins on `created_at`;
/// every later interaction refreshes the name fields and `updated_at`.
pub async fn upsert_user(
    pool: &DbPool,
    id: i64,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
) -> Result<UserRow, DbError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, first_name, last_name, username, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(id) DO UPDATE
         SET first_name = excluded.first_name,
             last_name = excluded.last_name,
             username = excluded.username,
             updated_at = excluded.updated_at
         RETURNING id, first_name, last_name, username, created_at, updated_at",
    )
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(username)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_user(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, username, created_at, updated_at
         FROM users
         WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
