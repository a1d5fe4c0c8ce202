//! Click entity representing a single redirect event.

use chrono::{DateTime, Utc};

/// Client metadata attached to a click.
///
/// `browser` and `platform` are filled in after the click is stored, by a
/// best-effort follow-up that parses the user agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickProperties {
    pub ip: Option<String>,
    pub referrer: Option<String>,
    pub browser: Option<String>,
    pub platform: Option<String>,
    pub country: Option<String>,
}

/// A click recorded when a short URL is followed.
#[derive(Debug, Clone)]
pub struct Click {
    #[allow(dead_code)]
    pub id: i64,
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub properties: ClickProperties,
}

impl Click {
    pub fn new(id: i64, hash: String, created_at: DateTime<Utc>, properties: ClickProperties) -> Self {
        Self {
            id,
            hash,
            created_at,
            properties,
        }
    }
}

/// Input data for recording a new click.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub hash: String,
    pub ip: Option<String>,
    pub referrer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_creation() {
        let now = Utc::now();
        let click = Click::new(
            1,
            "abc123".to_string(),
            now,
            ClickProperties {
                ip: Some("10.0.0.1".to_string()),
                referrer: Some("https://google.com".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(click.hash, "abc123");
        assert_eq!(click.created_at, now);
        assert!(click.properties.browser.is_none());
        assert!(click.properties.platform.is_none());
    }
}
