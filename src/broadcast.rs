//! Best-effort fan-out of progress events to WebSocket clients.
//!
//! Events are serialized once and shared. A slow client that falls behind
//! the channel capacity skips the events it missed; nothing in a
//! translation job depends on delivery.

use crate::events::ProgressEvent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Arc<str>>,
    clients: Arc<AtomicUsize>,
}

/// A connected client's feed. Counts as a client until dropped.
pub struct Subscription {
    rx: broadcast::Receiver<Arc<str>>,
    clients: Arc<AtomicUsize>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let count = self.clients.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("WebSocket client connected ({} total)", count);
        Subscription {
            rx: self.tx.subscribe(),
            clients: self.clients.clone(),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }

    /// Send `event` to every subscriber. Returns how many received it.
    pub fn broadcast(&self, event: &ProgressEvent) -> usize {
        let text: Arc<str> = match serde_json::to_string(event) {
            Ok(text) => text.into(),
            Err(e) => {
                warn!("Failed to serialize progress event: {}", e);
                return 0;
            }
        };
        // No receivers is not an error here
        self.tx.send(text).unwrap_or(0)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Subscription {
    /// Next event, or `None` once the broadcaster is gone. Missed events
    /// are skipped.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        loop {
            match self.rx.recv().await {
                Ok(text) => return Some(text),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("WebSocket client lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let remaining = self.clients.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
        debug!("WebSocket client disconnected ({} remaining)", remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancelled_event(locale: &str) -> ProgressEvent {
        ProgressEvent::TranslationCancelled {
            locale: locale.to_string(),
            completed_batches: 0,
            total_batches: 1,
            translated: 0,
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let broadcaster = Broadcaster::default();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        assert_eq!(broadcaster.broadcast(&cancelled_event("es")), 2);
        let text = a.recv().await.unwrap();
        assert!(text.contains(r#""type":"translation_cancelled""#));
        assert_eq!(b.recv().await.unwrap(), text);
    }

    #[test]
    fn test_broadcast_without_clients() {
        let broadcaster = Broadcaster::default();
        assert_eq!(broadcaster.broadcast(&cancelled_event("es")), 0);
    }

    #[test]
    fn test_client_count_tracks_drops() {
        let broadcaster = Broadcaster::default();
        let a = broadcaster.subscribe();
        let b = broadcaster.subscribe();
        assert_eq!(broadcaster.client_count(), 2);
        drop(a);
        assert_eq!(broadcaster.client_count(), 1);
        drop(b);
        assert_eq!(broadcaster.client_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_missed_events() {
        let broadcaster = Broadcaster::new(2);
        let mut sub = broadcaster.subscribe();
        for locale in ["a", "b", "c", "d"] {
            broadcaster.broadcast(&cancelled_event(locale));
        }
        let text = sub.recv().await.unwrap();
        assert!(text.contains(r#""locale":"c""#));
    }
}
