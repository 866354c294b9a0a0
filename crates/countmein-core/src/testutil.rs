use tokio::sync::mpsc::UnboundedReceiver;

use crate::outbox::{Outbox, OutboundJob};
use crate::prompts::Prompts;
use crate::session::SessionStore;
use crate::{AppState, BotConfig};

/// Fresh state over a temp-file SQLite database, with the outbox receiver
/// handed back so tests can inspect what the handlers queued.
pub(crate) async fn test_state() -> (AppState, UnboundedReceiver<OutboundJob>) {
    let unique = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let db_path = std::env::temp_dir().join(format!("countmein-core-{unique}.db"));
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        db_path.to_string_lossy().replace('\\', "/")
    );
    let db = countmein_db::create_pool(&db_url, 5).await.expect("pool");
    countmein_db::run_migrations(&db).await.expect("migrations");

    let (outbox, rx) = Outbox::channel();
    let state = AppState {
        db,
        sessions: SessionStore::new(),
        outbox,
        prompts: Prompts::default(),
        config: BotConfig {
            bot_token: "test-token".to_string(),
            thumb_url: "https://example.com/thumb.jpg".to_string(),
        },
    };
    (state, rx)
}

/// Everything queued so far, without blocking.
pub(crate) fn drain(rx: &mut UnboundedReceiver<OutboundJob>) -> Vec<OutboundJob> {
    let mut jobs = Vec::new();
    while let Ok(job) = rx.try_recv() {
        jobs.push(job);
    }
    jobs
}
