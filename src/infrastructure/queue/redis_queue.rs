//! Redis-backed reachability queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{error, info};

use crate::application::services::validation_service::ValidationService;
use crate::domain::reachability_queue::{QueueError, ReachabilityMessage, ReachabilityPublisher};

/// List holding pending reachability messages.
pub const REACHABILITY_QUEUE_KEY: &str = "safe-shortener:reachability";

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Reachability queue on a Redis list.
///
/// Producers `LPUSH` and the consumer `RPOP`s, so messages are handled in
/// publish order. The list survives restarts, which means a message may be
/// handled again after a crash; the updates it triggers are idempotent.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    key: String,
}

impl RedisQueue {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let client = Client::open(redis_url)
            .map_err(|e| QueueError::Backend(format!("Failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| QueueError::Backend(format!("Failed to connect to Redis: {e}")))?;

        let mut test_conn = conn.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| QueueError::Backend(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis reachability queue");

        Ok(Self {
            conn,
            key: REACHABILITY_QUEUE_KEY.to_string(),
        })
    }

    /// Pops and handles messages until shutdown starts.
    ///
    /// Sleeps briefly when the list is empty and backs off on Redis errors.
    pub async fn run_consumer(self, validation: Arc<ValidationService>) {
        info!(key = %self.key, "Reachability consumer started (redis)");
        let mut conn = self.conn.clone();

        while !validation.is_shutting_down() {
            match conn.rpop::<_, Option<String>>(&self.key, None).await {
                Ok(Some(raw)) => super::consume(&validation, &raw).await,
                Ok(None) => tokio::time::sleep(IDLE_POLL_INTERVAL).await,
                Err(e) => {
                    error!(error = %e, "Redis RPOP failed");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }

        info!("Reachability consumer stopped");
    }
}

#[async_trait]
impl ReachabilityPublisher for RedisQueue {
    async fn publish(&self, message: ReachabilityMessage) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.key, message.encode())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))
    }

    fn transport(&self) -> &'static str {
        "redis"
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
