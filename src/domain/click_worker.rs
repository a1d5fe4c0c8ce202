//! Background worker that persists click events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickRepository;
use crate::utils::user_agent::parse_user_agent;

const SAVE_RETRIES: usize = 3;

/// Drains the click channel until every sender is dropped.
///
/// Each click is saved with exponential backoff. Once stored, a detached
/// follow-up parses the user agent and fills in `browser` / `platform`.
/// The follow-up is best effort: failures are logged and never retried.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn ClickRepository>,
) {
    while let Some(event) = rx.recv().await {
        let new_click = event.to_new_click();
        let strategy = ExponentialBackoff::from_millis(10)
            .map(jitter)
            .take(SAVE_RETRIES);

        let saved = Retry::spawn(strategy, || repository.save(new_click.clone())).await;

        match saved {
            Ok(_) => {
                if let Some(user_agent) = event.user_agent {
                    tokio::spawn(apply_user_agent(
                        repository.clone(),
                        event.hash,
                        user_agent,
                    ));
                }
            }
            Err(e) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                tracing::error!(hash = %event.hash, error = %e, "Failed to save click");
            }
        }
    }

    tracing::info!("Click worker stopped");
}

async fn apply_user_agent(repository: Arc<dyn ClickRepository>, hash: String, user_agent: String) {
    let Some(agent) = parse_user_agent(&user_agent) else {
        return;
    };

    if let Some(browser) = agent.browser
        && let Err(e) = repository.update_browser(&hash, &browser).await
    {
        tracing::warn!(hash = %hash, error = %e, "Failed to update click browser");
    }

    if let Some(platform) = agent.platform
        && let Err(e) = repository.update_platform(&hash, &platform).await
    {
        tracing::warn!(hash = %hash, error = %e, "Failed to update click platform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Click, ClickProperties};
    use crate::domain::repositories::MockClickRepository;
    use crate::error::AppError;
    use chrono::Utc;

    fn stored(hash: &str) -> Click {
        Click::new(1, hash.to_string(), Utc::now(), ClickProperties::default())
    }

    #[tokio::test]
    async fn test_worker_retries_failed_save() {
        let mut repo = MockClickRepository::new();
        let mut calls = 0;
        repo.expect_save().times(2).returning(move |click| {
            calls += 1;
            if calls == 1 {
                Err(AppError::internal("Database error", serde_json::json!({})))
            } else {
                Ok(stored(&click.hash))
            }
        });

        let (tx, rx) = mpsc::channel(4);
        tx.send(ClickEvent::new("abc".to_string(), None, None, None))
            .await
            .unwrap();
        drop(tx);

        run_click_worker(rx, Arc::new(repo)).await;
    }

    #[tokio::test]
    async fn test_worker_gives_up_after_max_retries() {
        let mut repo = MockClickRepository::new();
        repo.expect_save()
            .times(SAVE_RETRIES + 1)
            .returning(|_| Err(AppError::internal("Database error", serde_json::json!({}))));

        let (tx, rx) = mpsc::channel(4);
        tx.send(ClickEvent::new("abc".to_string(), None, None, None))
            .await
            .unwrap();
        drop(tx);

        run_click_worker(rx, Arc::new(repo)).await;
    }
}
