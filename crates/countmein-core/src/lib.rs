pub mod callback;
pub mod conversation;
pub mod error;
pub mod inline;
pub mod outbox;
pub mod poll;
pub mod prompts;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

use countmein_db::DbPool;

/// Bot-level configuration shared by every handler.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// The bot token; doubles as the secret path segment of the webhook URL.
    pub bot_token: String,
    /// Thumbnail shown next to inline search results.
    pub thumb_url: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            thumb_url: "https://countmeinbot.appspot.com/thumb.jpg".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub sessions: session::SessionStore,
    pub outbox: outbox::Outbox,
    pub prompts: prompts::Prompts,
    pub config: BotConfig,
}
