use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

/// Same shape as a creator identity. Respondents live in their own table
/// so username and update time stay indexed for voter search.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RespondentRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn upsert_respondent(
    pool: &DbPool,
    id: i64,
    first_name: &str,
    last_name: Option<&str>,
    username: Option<&str>,
) -> Result<RespondentRow, DbError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, RespondentRow>(
        "INSERT INTO respondents (id, first_name, last_name, username, created_at, updated_at)
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
