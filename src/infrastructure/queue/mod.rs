//! Reachability queue transports.
//!
//! - [`ChannelQueue`] - in-process bounded channel
//! - [`RedisQueue`] - Redis list shared between instances
//!
//! Both deliver the `"<hash>|<url>"` wire form of
//! [`ReachabilityMessage`]; consumers hand every decoded message to
//! [`ValidationService::handle_reachability_message`].

mod channel_queue;
mod redis_queue;

pub use channel_queue::{ChannelConsumer, ChannelQueue};
pub use redis_queue::{REACHABILITY_QUEUE_KEY, RedisQueue};

use crate::application::services::validation_service::ValidationService;
use crate::domain::reachability_queue::ReachabilityMessage;

/// Decodes one raw message and runs its check.
///
/// Malformed messages are logged and dropped.
pub(crate) async fn consume(validation: &ValidationService, raw: &str) {
    let Some(message) = ReachabilityMessage::decode(raw) else {
        tracing::warn!(message = raw, "Dropping malformed reachability message");
        return;
    };

    let hash = message.hash.clone();
    let report = validation.handle_reachability_message(message).await;
    tracing::debug!(hash = %hash, result = %report.outcome, "Reachability message handled");
}
