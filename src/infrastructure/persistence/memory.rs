//! In-process repository implementations backed by `DashMap`.
//!
//! Used by the integration tests and by embedders running without a database.
//! Each update holds the shard lock of its entry for the whole
//! compare-and-set, which gives the same field-scoped atomicity as the
//! conditional SQL updates of the PostgreSQL repositories.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;

use crate::domain::entities::{
    BlockState, Click, ClickProperties, NewClick, ReachableState, RedirectMode, SafetyState,
    ShortUrl,
};
use crate::domain::repositories::{ClickRepository, ShortUrlRepository};
use crate::error::AppError;

#[derive(Default, Clone)]
pub struct MemoryShortUrlRepository {
    inner: Arc<DashMap<String, ShortUrl>>,
}

impl MemoryShortUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Applies `merge` to the stored record. Returns whether it changed.
    fn merge_in(&self, hash: &str, merge: impl FnOnce(&mut ShortUrl) -> bool) -> bool {
        match self.inner.get_mut(hash) {
            Some(mut entry) => merge(entry.value_mut()),
            None => false,
        }
    }
}

#[async_trait]
impl ShortUrlRepository for MemoryShortUrlRepository {
    async fn save(&self, short_url: ShortUrl) -> Result<ShortUrl, AppError> {
        match self.inner.entry(short_url.hash.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "Short URL already exists",
                json!({ "hash": short_url.hash }),
            )),
            Entry::Vacant(slot) => {
                slot.insert(short_url.clone());
                Ok(short_url)
            }
        }
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        Ok(self.inner.get(hash).map(|entry| entry.value().clone()))
    }

    async fn update_block_state(&self, hash: &str, state: BlockState) -> Result<bool, AppError> {
        Ok(self.merge_in(hash, |record| {
            let merged = record.block_state.merge(state);
            let changed = merged != record.block_state;
            record.block_state = merged;
            changed
        }))
    }

    async fn update_reachable_state(
        &self,
        hash: &str,
        state: ReachableState,
    ) -> Result<bool, AppError> {
        Ok(self.merge_in(hash, |record| {
            let merged = record.reachable_state.merge(state);
            let changed = merged != record.reachable_state;
            record.reachable_state = merged;
            changed
        }))
    }

    async fn update_safe(&self, hash: &str, safe: bool) -> Result<bool, AppError> {
        Ok(self.merge_in(hash, |record| {
            let merged = record.safety.merge(SafetyState::from_safe(safe));
            let changed = merged != record.safety;
            record.safety = merged;
            changed
        }))
    }

    async fn update_redirect_mode(
        &self,
        hash: &str,
        mode: RedirectMode,
    ) -> Result<bool, AppError> {
        Ok(self.merge_in(hash, |record| {
            let merged = record.redirect_mode.merge(mode);
            let changed = merged != record.redirect_mode;
            record.redirect_mode = merged;
            changed
        }))
    }

    async fn reset_validation(&self, hash: &str) -> Result<bool, AppError> {
        Ok(self.merge_in(hash, |record| {
            record.reset_validation();
            true
        }))
    }

    async fn delete_by_hash(&self, hash: &str) -> Result<bool, AppError> {
        Ok(self.inner.remove(hash).is_some())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[derive(Default, Clone)]
pub struct MemoryClickRepository {
    clicks: Arc<DashMap<String, Vec<Click>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryClickRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn fill_unset(
        &self,
        hash: &str,
        field: impl Fn(&mut ClickProperties) -> &mut Option<String>,
        value: &str,
    ) -> u64 {
        let Some(mut entry) = self.clicks.get_mut(hash) else {
            return 0;
        };

        let mut updated = 0;
        for click in entry.value_mut().iter_mut() {
            let slot = field(&mut click.properties);
            if slot.is_none() {
                *slot = Some(value.to_string());
                updated += 1;
            }
        }
        updated
    }
}

#[async_trait]
impl ClickRepository for MemoryClickRepository {
    async fn save(&self, new_click: NewClick) -> Result<Click, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let click = Click::new(
            id,
            new_click.hash.clone(),
            Utc::now(),
            ClickProperties {
                ip: new_click.ip,
                referrer: new_click.referrer,
                ..Default::default()
            },
        );

        self.clicks
            .entry(new_click.hash)
            .or_default()
            .push(click.clone());

        Ok(click)
    }

    async fn find_all_by_hash(&self, hash: &str) -> Result<Vec<Click>, AppError> {
        Ok(self
            .clicks
            .get(hash)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn update_browser(&self, hash: &str, browser: &str) -> Result<u64, AppError> {
        Ok(self.fill_unset(hash, |p| &mut p.browser, browser))
    }

    async fn update_platform(&self, hash: &str, platform: &str) -> Result<u64, AppError> {
        Ok(self.fill_unset(hash, |p| &mut p.platform, platform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ShortUrlProperties, ValidationOutcome};

    fn record(hash: &str) -> ShortUrl {
        ShortUrl::new(
            hash.to_string(),
            "https://example.com/".to_string(),
            ShortUrlProperties::default(),
        )
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_hash() {
        let repo = MemoryShortUrlRepository::new();
        repo.save(record("dup")).await.unwrap();

        let result = repo.save(record("dup")).await;

        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_updates_follow_merge_policy() {
        let repo = MemoryShortUrlRepository::new();
        repo.save(record("m1")).await.unwrap();

        assert!(repo.update_block_state("m1", BlockState::FailBlockUrl).await.unwrap());
        assert!(!repo.update_block_state("m1", BlockState::Ok).await.unwrap());
        assert!(!repo.update_block_state("m1", BlockState::FailBlockIp).await.unwrap());

        assert!(repo.update_redirect_mode("m1", RedirectMode::FORBIDDEN).await.unwrap());
        assert!(!repo.update_redirect_mode("m1", RedirectMode::BAD_REQUEST).await.unwrap());

        assert!(repo.update_safe("m1", false).await.unwrap());
        assert!(!repo.update_safe("m1", true).await.unwrap());

        let stored = repo.find_by_hash("m1").await.unwrap().unwrap();
        assert_eq!(stored.block_state, BlockState::FailBlockUrl);
        assert_eq!(stored.redirect_mode, RedirectMode::FORBIDDEN);
        assert!(!stored.is_safe());
        assert_eq!(stored.outcome(), ValidationOutcome::BlockedUrl);
    }

    #[tokio::test]
    async fn test_partial_block_results_combine() {
        let repo = MemoryShortUrlRepository::new();
        repo.save(record("m2")).await.unwrap();

        assert!(repo.update_block_state("m2", BlockState::OkUrl).await.unwrap());
        assert!(!repo.update_block_state("m2", BlockState::OkUrl).await.unwrap());
        assert!(repo.update_block_state("m2", BlockState::OkIp).await.unwrap());

        let stored = repo.find_by_hash("m2").await.unwrap().unwrap();
        assert_eq!(stored.block_state, BlockState::Ok);
    }

    #[tokio::test]
    async fn test_updates_on_unknown_hash_are_noops() {
        let repo = MemoryShortUrlRepository::new();

        assert!(!repo.update_reachable_state("nope", ReachableState::Reachable).await.unwrap());
        assert!(!repo.delete_by_hash("nope").await.unwrap());
        assert!(!repo.reset_validation("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_validation_clears_failures() {
        let repo = MemoryShortUrlRepository::new();
        repo.save(record("r1")).await.unwrap();
        repo.update_reachable_state("r1", ReachableState::FailNotReachable)
            .await
            .unwrap();
        repo.update_redirect_mode("r1", RedirectMode::BAD_REQUEST)
            .await
            .unwrap();

        assert!(repo.reset_validation("r1").await.unwrap());

        let stored = repo.find_by_hash("r1").await.unwrap().unwrap();
        assert_eq!(stored.reachable_state, ReachableState::NotDone);
        assert_eq!(stored.redirect_mode, RedirectMode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn test_click_user_agent_fields_only_fill_unset() {
        let repo = MemoryClickRepository::new();
        for _ in 0..2 {
            repo.save(NewClick {
                hash: "c1".to_string(),
                ip: None,
                referrer: None,
            })
            .await
            .unwrap();
        }

        assert_eq!(repo.update_browser("c1", "Firefox").await.unwrap(), 2);
        assert_eq!(repo.update_browser("c1", "Chrome").await.unwrap(), 0);
        assert_eq!(repo.update_platform("c1", "Linux").await.unwrap(), 2);

        let clicks = repo.find_all_by_hash("c1").await.unwrap();
        assert_eq!(clicks.len(), 2);
        assert!(
            clicks
                .iter()
                .all(|c| c.properties.browser.as_deref() == Some("Firefox"))
        );
        assert_ne!(clicks[0].id, clicks[1].id);
    }
}
