//! Consumes the outbox and performs the actual Bot API calls.
//!
//! Delivery is at-least-once: transport failures and rate limits are
//! retried a few times with backoff, and a fixed allow-list of Bot API
//! rejections is treated as benign (the world moved on under us) rather
//! than as a delivery failure.

use std::time::Duration;

use countmein_core::outbox::OutboundJob;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Bot API rejections that mean the target message or query is gone or
/// already up to date. Matched case-insensitively against the response
/// description.
const BENIGN_ERRORS: &[&str] = &[
    "message is not modified",
    "message to edit not found",
    "message_id_invalid",
    "bot was blocked",
    "query is too old",
];

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

fn is_benign(description: &str) -> bool {
    let lowered = description.to_lowercase();
    BENIGN_ERRORS.iter().any(|known| lowered.contains(known))
}

/// Runs until the sending side of the outbox is dropped.
pub async fn delivery_worker(
    mut rx: UnboundedReceiver<OutboundJob>,
    client: reqwest::Client,
    api_root: String,
) {
    while let Some(job) = rx.recv().await {
        if !job.delay.is_zero() {
            tokio::time::sleep(job.delay).await;
        }
        deliver(&client, &api_root, &job).await;
    }
    tracing::info!("outbox closed, delivery worker stopping");
}

async fn deliver(client: &reqwest::Client, api_root: &str, job: &OutboundJob) {
    let method = job.request.method();
    let url = format!("{api_root}/{method}");

    for attempt in 1..=MAX_ATTEMPTS {
        let response = match client.post(&url).json(&job.request).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(method, attempt, "transport error: {err}");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                continue;
            }
        };

        if response.status().as_u16() == 429 {
            tracing::warn!(method, attempt, "rate limited");
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            continue;
        }

        match response.json::<ApiResponse>().await {
            Ok(body) if body.ok => {
                tracing::debug!(method, "delivered");
            }
            Ok(body) => {
                let description = body.description.unwrap_or_default();
                if is_benign(&description) {
                    tracing::info!(method, %description, "request rejected, ignoring");
                } else {
                    tracing::error!(method, %description, "request rejected");
                }
            }
            Err(err) => {
                tracing::error!(method, "unreadable response: {err}");
            }
        }
        return;
    }
    tracing::error!(method, "delivery abandoned after {MAX_ATTEMPTS} attempts");
}
