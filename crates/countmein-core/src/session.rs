//! Per-conversation dialogue state with a one-hour idle expiry.
//!
//! The cache's idle eviction is the backstop; every read also checks the
//! entry's own expiry timestamp, so a stale entry is treated as absent even
//! when it has not been evicted yet.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use moka::future::Cache;
use std::time::Duration;

pub const SESSION_TTL_SECS: u64 = 3600;

/// What the next inbound text from this conversation means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Awaiting a poll title.
    Start,
    /// Awaiting another option (or a finish signal) for this poll.
    AwaitingOption(i64),
}

#[derive(Debug, Clone)]
struct SessionEntry {
    state: SessionState,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<i64, SessionEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(SESSION_TTL_SECS))
                .build(),
        }
    }

    pub async fn get(&self, chat_id: i64) -> Option<SessionState> {
        let entry = self.cache.get(&chat_id).await?;
        if entry.expires_at <= Utc::now() {
            self.cache.invalidate(&chat_id).await;
            return None;
        }
        Some(entry.state)
    }

    pub async fn set(&self, chat_id: i64, state: SessionState) {
        let entry = SessionEntry {
            state,
            expires_at: Utc::now() + ChronoDuration::seconds(SESSION_TTL_SECS as i64),
        };
        self.cache.insert(chat_id, entry).await;
    }

    pub async fn clear(&self, chat_id: i64) {
        self.cache.invalidate(&chat_id).await;
    }

    #[cfg(test)]
    pub(crate) async fn set_already_expired(&self, chat_id: i64, state: SessionState) {
        let entry = SessionEntry {
            state,
            expires_at: Utc::now() - ChronoDuration::seconds(1),
        };
        self.cache.insert(chat_id, entry).await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
