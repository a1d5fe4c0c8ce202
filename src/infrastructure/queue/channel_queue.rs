//! In-process reachability queue.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::application::services::validation_service::ValidationService;
use crate::domain::reachability_queue::{QueueError, ReachabilityMessage, ReachabilityPublisher};

/// Producer side of a bounded in-process channel.
#[derive(Clone)]
pub struct ChannelQueue {
    sender: mpsc::Sender<String>,
}

/// Consumer side of a [`ChannelQueue`].
pub struct ChannelConsumer {
    receiver: mpsc::Receiver<String>,
}

impl ChannelQueue {
    /// Creates a queue holding at most `capacity` pending messages.
    pub fn new(capacity: usize) -> (Self, ChannelConsumer) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, ChannelConsumer { receiver })
    }
}

#[async_trait]
impl ReachabilityPublisher for ChannelQueue {
    async fn publish(&self, message: ReachabilityMessage) -> Result<(), QueueError> {
        self.sender
            .try_send(message.encode())
            .map_err(|e| match e {
                TrySendError::Full(_) => QueueError::Full,
                TrySendError::Closed(_) => QueueError::Closed,
            })
    }

    fn transport(&self) -> &'static str {
        "channel"
    }

    async fn health_check(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl ChannelConsumer {
    /// Handles messages until every producer is gone or shutdown starts.
    pub async fn run(mut self, validation: Arc<ValidationService>) {
        tracing::info!("Reachability consumer started (channel)");

        loop {
            let raw = tokio::select! {
                raw = self.receiver.recv() => raw,
                () = validation.stopped() => None,
            };
            let Some(raw) = raw else {
                break;
            };
            super::consume(&validation, &raw).await;
        }

        tracing::info!("Reachability consumer stopped");
    }

    /// Next raw message, if any producer is alive.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}
