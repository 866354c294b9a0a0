//! Fire-and-forget hand-off of outbound Bot API requests.
//!
//! Inbound handlers enqueue and return immediately; the server binary owns
//! the receiving end and performs the actual HTTP delivery. Delivery is
//! at-least-once and the queue only tends towards FIFO, so nothing here may
//! rely on cross-job ordering.

use countmein_models::outbound::BotRequest;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
pub struct OutboundJob {
    pub request: BotRequest,
    pub delay: Duration,
}

#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboundJob>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, request: impl Into<BotRequest>) {
        self.enqueue_delayed(request, Duration::ZERO);
    }

    pub fn enqueue_delayed(&self, request: impl Into<BotRequest>, delay: Duration) {
        let request = request.into();
        tracing::info!(
            method = request.method(),
            delay_ms = delay.as_millis() as u64,
            "outbound request queued"
        );
        if self.tx.send(OutboundJob { request, delay }).is_err() {
            tracing::error!("outbox receiver dropped; outbound request lost");
        }
    }
}
