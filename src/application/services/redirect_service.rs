//! Redirect decisions for short URLs.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{RedirectMode, ValidationOutcome};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// What to answer for a short URL at this instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub target: String,
    pub mode: RedirectMode,
    pub outcome: ValidationOutcome,
}

impl RedirectDecision {
    /// Whether the client is sent to `target`.
    pub fn is_redirect(&self) -> bool {
        self.mode.is_redirect()
    }

    /// Error answered instead of a redirect, `None` when redirecting.
    pub fn rejection(&self, hash: &str) -> Option<AppError> {
        if self.is_redirect() {
            return None;
        }

        let message = self
            .outcome
            .description()
            .unwrap_or("Short URL cannot be served");
        let details = json!({ "hash": hash, "validation": self.outcome });

        Some(match self.mode {
            RedirectMode::FORBIDDEN => AppError::forbidden(message, details),
            RedirectMode::BAD_REQUEST => AppError::bad_request(message, details),
            other => AppError::internal(
                "Unexpected redirect mode",
                json!({ "hash": hash, "redirect_mode": other.code() }),
            ),
        })
    }
}

/// Reads the stored state of a short URL and decides how to answer.
///
/// The decision reflects whatever the checks have recorded so far. A
/// request that arrives before any check has finished is redirected with
/// the default mode.
pub struct RedirectService {
    repository: Arc<dyn ShortUrlRepository>,
}

impl RedirectService {
    pub fn new(repository: Arc<dyn ShortUrlRepository>) -> Self {
        Self { repository }
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the hash is unknown.
    pub async fn decide(&self, hash: &str) -> Result<RedirectDecision, AppError> {
        let Some(record) = self.repository.find_by_hash(hash).await? else {
            metrics::counter!("redirects_total", "status" => "404").increment(1);
            return Err(AppError::not_found(
                "Short URL not found",
                json!({ "hash": hash }),
            ));
        };

        let decision = RedirectDecision {
            outcome: record.outcome(),
            mode: record.redirect_mode,
            target: record.target,
        };

        metrics::counter!("redirects_total", "status" => decision.mode.code().to_string())
            .increment(1);
        tracing::debug!(
            hash,
            redirect_mode = decision.mode.code(),
            validation = %decision.outcome,
            "Redirect decided"
        );

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{BlockState, ReachableState, ShortUrl, ShortUrlProperties};
    use crate::domain::repositories::MockShortUrlRepository;
    use crate::infrastructure::persistence::MemoryShortUrlRepository;

    async fn seeded() -> (RedirectService, Arc<MemoryShortUrlRepository>) {
        let repo = Arc::new(MemoryShortUrlRepository::new());
        repo.save(ShortUrl::new(
            "abc".to_string(),
            "https://example.com/".to_string(),
            ShortUrlProperties::default(),
        ))
        .await
        .unwrap();

        (RedirectService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_fresh_record_redirects_optimistically() {
        let (service, _) = seeded().await;

        let decision = service.decide("abc").await.unwrap();

        assert!(decision.is_redirect());
        assert_eq!(decision.mode, RedirectMode::TEMPORARY_REDIRECT);
        assert_eq!(decision.target, "https://example.com/");
        assert_eq!(decision.outcome, ValidationOutcome::Pending);
        assert!(decision.rejection("abc").is_none());
    }

    #[tokio::test]
    async fn test_blocked_record_is_forbidden() {
        let (service, repo) = seeded().await;
        repo.update_redirect_mode("abc", RedirectMode::FORBIDDEN)
            .await
            .unwrap();
        repo.update_block_state("abc", BlockState::FailBlockIp)
            .await
            .unwrap();

        let decision = service.decide("abc").await.unwrap();

        assert!(!decision.is_redirect());
        assert_eq!(decision.outcome, ValidationOutcome::BlockedIp);
        assert!(matches!(
            decision.rejection("abc"),
            Some(AppError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_record_is_bad_request() {
        let (service, repo) = seeded().await;
        repo.update_redirect_mode("abc", RedirectMode::BAD_REQUEST)
            .await
            .unwrap();
        repo.update_reachable_state("abc", ReachableState::FailNotReachable)
            .await
            .unwrap();

        let decision = service.decide("abc").await.unwrap();

        assert!(matches!(
            decision.rejection("abc"),
            Some(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_hash_is_not_found() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_hash().returning(|_| Ok(None));
        let service = RedirectService::new(Arc::new(repo));

        let result = service.decide("missing").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
