//! WebSocket feed client.
//!
//! Connects to the metrics/alert feed, forwards every text frame to the
//! consumer channel and reconnects with exponential backoff when the
//! connection drops. Each successful connection is announced with
//! [`FeedMessage::SessionStarted`] so the core can start from a clean window.
//!
//! The client stops as soon as the receiving side of the channel is gone.

use std::time::Duration;

use futures::{Stream, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::config::ReconnectConfig;
use crate::engine::FeedMessage;

/// How one connection ended.
#[derive(Debug, PartialEq)]
enum SessionEnd {
    /// Server closed the stream (close frame or EOF).
    Closed,
    /// Transport error mid-session.
    Failed(String),
    /// Nobody is listening anymore; stop for good.
    ReceiverGone,
}

/// Run the feed until the consumer drops its receiver.
pub async fn run(url: &str, reconnect: &ReconnectConfig, tx: mpsc::Sender<FeedMessage>) {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let connected = tokio::select! {
            res = connect_async(url) => res,
            _ = tx.closed() => return,
        };

        match connected {
            Ok((ws, _resp)) => {
                tracing::info!(url = %url, "feed: connected");
                attempt = 1;

                if tx.send(FeedMessage::SessionStarted).await.is_err() {
                    return;
                }

                match pump(ws, &tx).await {
                    SessionEnd::ReceiverGone => {
                        tracing::info!("feed: consumer gone, stopping");
                        return;
                    }
                    SessionEnd::Closed => tracing::info!(url = %url, "feed: connection closed"),
                    SessionEnd::Failed(e) => {
                        tracing::warn!(url = %url, error = %e, "feed: connection failed")
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, attempt = attempt, error = %e, "feed: connect failed");
            }
        }

        let wait = calculate_backoff(reconnect, attempt);
        tracing::debug!(wait_ms = wait.as_millis() as u64, "feed: reconnecting");
        tokio::select! {
            _ = sleep(wait) => {}
            _ = tx.closed() => return,
        }
    }
}

/// Forward text frames until the session ends.
async fn pump<S>(mut ws: S, tx: &mpsc::Sender<FeedMessage>) -> SessionEnd
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            next = ws.next() => next,
            _ = tx.closed() => return SessionEnd::ReceiverGone,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                if tx.send(FeedMessage::Event(text)).await.is_err() {
                    return SessionEnd::ReceiverGone;
                }
            }
            Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
            // ping/pong are answered by tungstenite; binary frames are not part of the feed
            Some(Ok(_)) => {}
            Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
        }
    }
}

/// Exponential: base * 2^(attempt - 1), capped at max, plus random jitter.
fn calculate_backoff(config: &ReconnectConfig, attempt: u32) -> Duration {
    let base = config.base_backoff_ms as f64;
    let max = config.max_backoff_ms as f64;

    let exponent = attempt.saturating_sub(1).min(30) as i32;
    let raw_backoff = base * 2_f64.powi(exponent);
    let capped_backoff = raw_backoff.min(max);

    let jitter = if config.jitter_ms > 0 {
        rand::thread_rng().gen_range(0..=config.jitter_ms)
    } else {
        0
    };

    Duration::from_millis((capped_backoff as u64) + jitter)
}
