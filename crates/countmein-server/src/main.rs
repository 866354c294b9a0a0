use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod delivery;
mod webhook;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("countmein=info")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("no bot token configured; set [telegram] bot_token in {:?}", args.config);
    }

    ensure_db_dir(&config.database.url);
    let db =
        countmein_db::create_pool(&config.database.url, config.database.max_connections).await?;
    countmein_db::run_migrations(&db).await?;

    let (outbox, outbox_rx) = countmein_core::outbox::Outbox::channel();
    let client = reqwest::Client::new();
    let delivery = tokio::spawn(delivery::delivery_worker(
        outbox_rx,
        client,
        config.api_root(),
    ));

    let state = countmein_core::AppState {
        db,
        sessions: countmein_core::session::SessionStore::new(),
        outbox,
        prompts: countmein_core::prompts::Prompts::default(),
        config: countmein_core::BotConfig {
            bot_token: config.telegram.bot_token.clone(),
            thumb_url: config.telegram.thumb_url.clone(),
        },
    };

    let app = webhook::router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %config.database.url,
        "CountMeIn Bot listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    // The server dropped the last outbox sender; let the worker flush what
    // is already queued before exiting.
    delivery.await?;
    Ok(())
}

/// Create the database's parent directory so a first run does not fail on
/// a missing path.
fn ensure_db_dir(db_url: &str) {
    if let Some(db_path) = db_url
        .strip_prefix("sqlite://")
        .and_then(|rest| rest.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(parent) {
                    tracing::warn!("could not create directory {parent:?}: {err}");
                }
            }
        }
    }
}
