//! Hand-off of click events to the background click worker.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::click_event::ClickEvent;

/// Producer side of the click queue.
///
/// Tracking never waits: when the queue is full or the worker is gone the
/// click is dropped and counted in `clicks_dropped_total`.
#[derive(Clone)]
pub struct ClickService {
    sender: mpsc::Sender<ClickEvent>,
}

impl ClickService {
    pub fn new(sender: mpsc::Sender<ClickEvent>) -> Self {
        Self { sender }
    }

    /// Queues `event`; returns `false` if it was dropped.
    pub fn track(&self, event: ClickEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                tracing::warn!(hash = %event.hash, "Click queue full, dropping click");
                false
            }
            Err(TrySendError::Closed(event)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                tracing::error!(hash = %event.hash, "Click worker stopped, dropping click");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ClickEvent {
        ClickEvent::new("abc".to_string(), Some("127.0.0.1".to_string()), None, None)
    }

    #[tokio::test]
    async fn test_track_queues_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let service = ClickService::new(tx);

        assert!(service.track(event()));
        assert_eq!(service.capacity(), 3);
        assert_eq!(rx.recv().await.unwrap().hash, "abc");
    }

    #[test]
    fn test_track_drops_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        let service = ClickService::new(tx);

        assert!(service.track(event()));
        assert!(!service.track(event()));
    }

    #[test]
    fn test_track_drops_when_worker_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let service = ClickService::new(tx);

        assert!(service.is_closed());
        assert!(!service.track(event()));
    }
}
