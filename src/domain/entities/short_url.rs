//! Short URL aggregate: a hash mapped to a destination plus its validation state.

use chrono::{DateTime, Utc};

use super::validation::{BlockState, ReachableState, RedirectMode, SafetyState, ValidationOutcome};

/// Properties recorded when the short URL is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortUrlProperties {
    pub ip: Option<String>,
    pub sponsor: Option<String>,
    pub country: Option<String>,
}

/// A persisted short URL.
///
/// `hash`, `target`, `created_at` and `properties` never change after
/// creation. The validation fields are only mutated through the merge-aware
/// updates of [`crate::domain::repositories::ShortUrlRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrl {
    pub hash: String,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub redirect_mode: RedirectMode,
    pub safety: SafetyState,
    pub block_state: BlockState,
    pub reachable_state: ReachableState,
    pub properties: ShortUrlProperties,
}

impl ShortUrl {
    /// Creates a record with every validation field at its initial value.
    pub fn new(hash: String, target: String, properties: ShortUrlProperties) -> Self {
        Self {
            hash,
            target,
            created_at: Utc::now(),
            redirect_mode: RedirectMode::default(),
            safety: SafetyState::NotDone,
            block_state: BlockState::NotDone,
            reachable_state: ReachableState::NotDone,
            properties,
        }
    }

    pub fn is_safe(&self) -> bool {
        self.safety.is_safe()
    }

    /// Current validation outcome computed from the stored fields.
    pub fn outcome(&self) -> ValidationOutcome {
        ValidationOutcome::from_states(self.block_state, self.reachable_state, self.safety)
    }

    /// Resets the validation fields to their initial values.
    pub fn reset_validation(&mut self) {
        self.redirect_mode = RedirectMode::default();
        self.safety = SafetyState::NotDone;
        self.block_state = BlockState::NotDone;
        self.reachable_state = ReachableState::NotDone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShortUrl {
        ShortUrl::new(
            "abc123".to_string(),
            "https://example.com/".to_string(),
            ShortUrlProperties {
                ip: Some("127.0.0.1".to_string()),
                sponsor: None,
                country: None,
            },
        )
    }

    #[test]
    fn test_new_short_url_defaults() {
        let short_url = sample();

        assert_eq!(short_url.redirect_mode.code(), 307);
        assert!(short_url.is_safe());
        assert_eq!(short_url.block_state, BlockState::NotDone);
        assert_eq!(short_url.reachable_state, ReachableState::NotDone);
        assert_eq!(short_url.outcome(), ValidationOutcome::Pending);
    }

    #[test]
    fn test_reset_validation() {
        let mut short_url = sample();
        short_url.redirect_mode = RedirectMode::FORBIDDEN;
        short_url.block_state = BlockState::FailBlockUrl;
        short_url.safety = SafetyState::Unsafe;

        short_url.reset_validation();

        assert_eq!(short_url.redirect_mode, RedirectMode::TEMPORARY_REDIRECT);
        assert_eq!(short_url.block_state, BlockState::NotDone);
        assert_eq!(short_url.safety, SafetyState::NotDone);
        assert_eq!(short_url.hash, "abc123");
    }
}
