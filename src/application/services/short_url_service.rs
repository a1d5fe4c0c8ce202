//! Short URL creation, lookup and administration.

use std::sync::Arc;

use serde_json::json;

use crate::application::services::validation_service::{ValidationRequest, ValidationService};
use crate::domain::entities::{Click, ShortUrl, ShortUrlProperties};
use crate::domain::repositories::{ClickRepository, ShortUrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::generate_hash;
use crate::utils::url_normalizer::{normalize_url, short_url};

/// Input for creating a short URL.
#[derive(Debug, Clone, Default)]
pub struct CreateShortUrl {
    pub url: String,
    pub sponsor: Option<String>,
    pub ip: Option<String>,
}

/// A record together with its click history.
#[derive(Debug, Clone)]
pub struct ShortUrlInfo {
    pub short_url: ShortUrl,
    pub clicks: Vec<Click>,
}

/// Service for creating, inspecting and administering short URLs.
///
/// Creation persists the record with every validation field at its initial
/// value and starts the validation fan-out without waiting for it.
pub struct ShortUrlService {
    repository: Arc<dyn ShortUrlRepository>,
    clicks: Arc<dyn ClickRepository>,
    validation: Arc<ValidationService>,
    base_url: String,
}

impl ShortUrlService {
    pub fn new(
        repository: Arc<dyn ShortUrlRepository>,
        clicks: Arc<dyn ClickRepository>,
        validation: Arc<ValidationService>,
        base_url: String,
    ) -> Self {
        Self {
            repository,
            clicks,
            validation,
            base_url,
        }
    }

    /// Public short URL of `hash`.
    pub fn short_url(&self, hash: &str) -> String {
        short_url(&self.base_url, hash)
    }

    /// Creates a short URL and starts its validation in the background.
    ///
    /// Returns the record as first written; validation results become
    /// visible on later reads.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not an absolute
    /// HTTP(S) URL, [`AppError::Internal`] if no free hash could be found.
    pub async fn create(&self, input: CreateShortUrl) -> Result<ShortUrl, AppError> {
        let record = self.insert(input).await?;

        // Detached: the checks keep running after the response is sent.
        drop(self.validation.validate(request_for(&record)));

        tracing::info!(hash = %record.hash, target = %record.target, "Short URL created");
        Ok(record)
    }

    /// Creates a short URL and waits for every check to finish.
    ///
    /// Returns the record with its final validation state.
    ///
    /// # Errors
    ///
    /// See [`Self::create`].
    pub async fn create_validated(&self, input: CreateShortUrl) -> Result<ShortUrl, AppError> {
        let record = self.insert(input).await?;
        self.validation.validate_and_wait(request_for(&record)).await;
        self.find(&record.hash).await
    }

    /// Returns a record and its clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the hash is unknown.
    pub async fn info(&self, hash: &str) -> Result<ShortUrlInfo, AppError> {
        let short_url = self.find(hash).await?;
        let clicks = self.clicks.find_all_by_hash(hash).await?;

        Ok(ShortUrlInfo { short_url, clicks })
    }

    /// Returns a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the hash is unknown.
    pub async fn find(&self, hash: &str) -> Result<ShortUrl, AppError> {
        self.repository
            .find_by_hash(hash)
            .await?
            .ok_or_else(|| not_found(hash))
    }

    /// Deletes a record and, through the foreign key, its clicks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the hash is unknown.
    pub async fn delete(&self, hash: &str) -> Result<(), AppError> {
        if !self.repository.delete_by_hash(hash).await? {
            return Err(not_found(hash));
        }

        tracing::info!(hash, "Short URL deleted");
        Ok(())
    }

    /// Clears the recorded validation state and runs every check again.
    ///
    /// This is the only path that can turn a recorded failure back into a
    /// success. Waits for the checks and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the hash is unknown.
    pub async fn revalidate(&self, hash: &str) -> Result<ShortUrl, AppError> {
        let record = self.find(hash).await?;

        if !self.repository.reset_validation(hash).await? {
            return Err(not_found(hash));
        }
        tracing::info!(hash, "Validation state reset");

        self.validation.validate_and_wait(request_for(&record)).await;
        self.find(hash).await
    }

    async fn insert(&self, input: CreateShortUrl) -> Result<ShortUrl, AppError> {
        const MAX_ATTEMPTS: usize = 10;

        let target = normalize_url(&input.url).map_err(|e| {
            AppError::bad_request(
                "URL must be an absolute http or https URI",
                json!({ "url": input.url, "reason": e.to_string() }),
            )
        })?;

        let properties = ShortUrlProperties {
            ip: input.ip,
            sponsor: input.sponsor.filter(|s| !s.trim().is_empty()),
            country: None,
        };

        for _ in 0..MAX_ATTEMPTS {
            let hash = generate_hash().map_err(|e| {
                AppError::internal("Failed to generate hash", json!({ "reason": e.to_string() }))
            })?;

            if self.repository.find_by_hash(&hash).await?.is_some() {
                continue;
            }

            let record = ShortUrl::new(hash, target.clone(), properties.clone());
            match self.repository.save(record).await {
                Ok(saved) => return Ok(saved),
                Err(AppError::Conflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique hash",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

fn request_for(record: &ShortUrl) -> ValidationRequest {
    ValidationRequest::new(
        record.hash.clone(),
        record.target.clone(),
        record.properties.ip.clone(),
    )
}

fn not_found(hash: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "hash": hash }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkers::{
        BlockListChecker, ListKind, MockReachabilityChecker, MockSafetyChecker,
        ReachabilityVerdict, SafetyVerdict,
    };
    use crate::domain::entities::{RedirectMode, ValidationOutcome};
    use crate::domain::repositories::{MockClickRepository, MockShortUrlRepository};
    use crate::infrastructure::checkers::StaticBlockListProvider;
    use crate::infrastructure::persistence::{MemoryClickRepository, MemoryShortUrlRepository};

    fn validation(
        repo: Arc<dyn ShortUrlRepository>,
        blocked_urls: &[&str],
        reachable: bool,
    ) -> Arc<ValidationService> {
        let provider = StaticBlockListProvider::new()
            .with_entries(ListKind::Url, blocked_urls.iter().copied());
        let mut probe = MockReachabilityChecker::new();
        probe.expect_check().returning(move |_| {
            if reachable {
                ReachabilityVerdict::Reachable
            } else {
                ReachabilityVerdict::NotReachable
            }
        });
        let mut safety = MockSafetyChecker::new();
        safety.expect_check().returning(|_| Ok(SafetyVerdict::Safe));

        Arc::new(ValidationService::new(
            repo,
            BlockListChecker::new(Arc::new(provider)),
            Arc::new(probe),
            Arc::new(safety),
        ))
    }

    fn service(blocked_urls: &[&str], reachable: bool) -> (ShortUrlService, Arc<MemoryShortUrlRepository>) {
        let repo = Arc::new(MemoryShortUrlRepository::new());
        let service = ShortUrlService::new(
            repo.clone(),
            Arc::new(MemoryClickRepository::new()),
            validation(repo.clone(), blocked_urls, reachable),
            "http://localhost:3000".to_string(),
        );
        (service, repo)
    }

    fn input(url: &str) -> CreateShortUrl {
        CreateShortUrl {
            url: url.to_string(),
            sponsor: None,
            ip: Some("127.0.0.1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_returns_defaults_and_normalizes() {
        let (service, _) = service(&[], true);

        let record = service.create(input("https://EXAMPLE.com:443/a#frag")).await.unwrap();

        assert_eq!(record.target, "https://example.com/a");
        assert_eq!(record.hash.len(), 12);
        assert_eq!(record.redirect_mode, RedirectMode::TEMPORARY_REDIRECT);
        assert_eq!(record.outcome(), ValidationOutcome::Pending);
        assert_eq!(
            service.short_url(&record.hash),
            format!("http://localhost:3000/{}", record.hash)
        );
    }

    #[tokio::test]
    async fn test_create_rejects_non_http_url() {
        let (service, _) = service(&[], true);

        let result = service.create(input("ftp://example.com/")).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_create_validated_waits_for_checks() {
        let (service, _) = service(&["example.com"], true);

        let record = service.create_validated(input("https://example.com/")).await.unwrap();

        assert_eq!(record.outcome(), ValidationOutcome::BlockedUrl);
        assert_eq!(record.redirect_mode, RedirectMode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_retries_on_hash_collision() {
        let mut repo = MockShortUrlRepository::new();
        let mut seen = 0;
        repo.expect_find_by_hash().times(2).returning(move |hash| {
            seen += 1;
            if seen == 1 {
                Ok(Some(ShortUrl::new(
                    hash.to_string(),
                    "https://taken.example/".to_string(),
                    ShortUrlProperties::default(),
                )))
            } else {
                Ok(None)
            }
        });
        repo.expect_save().times(1).returning(Ok);

        let repo: Arc<dyn ShortUrlRepository> = Arc::new(repo);
        let service = ShortUrlService::new(
            repo.clone(),
            Arc::new(MockClickRepository::new()),
            validation(Arc::new(MemoryShortUrlRepository::new()), &[], true),
            "http://localhost:3000".to_string(),
        );

        let result = service.insert(input("https://example.com/")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_revalidate_clears_failure() {
        let (service, repo) = service(&[], true);
        let record = service.create_validated(input("https://example.com/")).await.unwrap();
        repo.update_block_state(&record.hash, crate::domain::entities::BlockState::FailBlockUrl)
            .await
            .unwrap();
        repo.update_redirect_mode(&record.hash, RedirectMode::FORBIDDEN)
            .await
            .unwrap();

        let revalidated = service.revalidate(&record.hash).await.unwrap();

        assert_eq!(revalidated.outcome(), ValidationOutcome::Ok);
        assert_eq!(revalidated.redirect_mode, RedirectMode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn test_delete_and_info_not_found() {
        let (service, _) = service(&[], true);

        assert!(matches!(service.delete("missing").await, Err(AppError::NotFound { .. })));
        assert!(matches!(service.info("missing").await, Err(AppError::NotFound { .. })));
        assert!(matches!(
            service.revalidate("missing").await,
            Err(AppError::NotFound { .. })
        ));
    }
}
