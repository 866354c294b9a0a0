use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Longest prefix of a title kept for search and share links, in characters.
pub const TITLE_PREFIX_LEN: usize = 512;

/// One voter entry inside an option. Order of entries is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub title: String,
    pub people: Vec<Voter>,
}

impl PollOption {
    /// A fresh option with its own empty voter list.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            people: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub admin_id: i64,
    pub title: String,
    pub title_short: String,
    pub active: bool,
    pub multi: bool,
    pub options: Json<Vec<PollOption>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PollRow {
    pub fn options(&self) -> &[PollOption] {
        &self.options.0
    }
}

/// Lowercase prefix of the title, truncated on a character boundary.
pub fn title_prefix_key(title: &str) -> String {
    title
        .chars()
        .take(TITLE_PREFIX_LEN)
        .collect::<String>()
        .to_lowercase()
}

pub async fn create_poll(pool: &DbPool, admin_id: i64, title: &str) -> Result<PollRow, DbError> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, PollRow>(
        "INSERT INTO polls (admin_id, title, title_short, options, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)
         RETURNING id, admin_id, title, title_short, active, multi, options, version, created_at, updated_at",
    )
    .bind(admin_id)
    .bind(title)
    .bind(title_prefix_key(title))
    .bind(Json(Vec::<PollOption>::new()))
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_poll(pool: &DbPool, id: i64) -> Result<Option<PollRow>, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "SELECT id, admin_id, title, title_short, active, multi, options, version, created_at, updated_at
         FROM polls
         WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Compare-and-swap write of a poll's options. Returns the updated row, or
/// `None` when `expected_version` no longer matches and the caller must
/// re-read and retry.
pub async fn update_options(
    pool: &DbPool,
    id: i64,
    expected_version: i64,
    options: &[PollOption],
) -> Result<Option<PollRow>, DbError> {
    let row = sqlx::query_as::<_, PollRow>(
        "UPDATE polls
         SET options = ?3, version = version + 1, updated_at = ?4
         WHERE id = ?1 AND version = ?2
         RETURNING id, admin_id, title, title_short, active, multi, options, version, created_at, updated_at",
    )
    .bind(id)
    .bind(expected_version)
    .bind(Json(options))
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_poll(pool: &DbPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM polls WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// The caller's polls, newest first.
pub async fn list_polls_by_admin(
    pool: &DbPool,
    admin_id: i64,
    limit: i64,
) -> Result<Vec<PollRow>, DbError> {
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT id, admin_id, title, title_short, active, multi, options, version, created_at, updated_at
         FROM polls
         WHERE admin_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )
    .bind(admin_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Prefix match over `title_short`: the half-open range
/// `[prefix, prefix + U+10FFFF)` selects exactly the keys starting with
/// `prefix`. The prefix must already be lowercase.
pub async fn search_polls_by_title_prefix(
    pool: &DbPool,
    admin_id: i64,
    prefix: &str,
    limit: i64,
) -> Result<Vec<PollRow>, DbError> {
    let upper = format!("{prefix}\u{10FFFF}");
    let rows = sqlx::query_as::<_, PollRow>(
        "SELECT id, admin_id, title, title_short, active, multi, options, version, created_at, updated_at
         FROM polls
         WHERE admin_id = ?1 AND title_short >= ?2 AND title_short < ?3
         ORDER BY created_at DESC, id DESC
         LIMIT ?4",
    )
    .bind(admin_id)
    .bind(prefix)
    .bind(upper)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
