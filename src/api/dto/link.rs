//! DTOs for short URL endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::ShortUrlInfo;
use crate::domain::entities::{
    BlockState, Click, ReachableState, SafetyState, ShortUrl, ValidationOutcome,
};

/// Form submitted to create a short URL.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkForm {
    /// Destination; must be an absolute http(s) URL.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1 to 2048 characters"))]
    pub url: String,

    #[validate(length(max = 255))]
    pub sponsor: Option<String>,
}

/// Creation response.
#[derive(Debug, Serialize)]
pub struct CreateLinkResponse {
    /// Public short URL.
    pub url: String,
    pub properties: LinkProperties,
}

#[derive(Debug, Serialize)]
pub struct LinkProperties {
    pub safe: bool,
    pub validation: ValidationOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl CreateLinkResponse {
    pub fn new(url: String, record: &ShortUrl) -> Self {
        let outcome = record.outcome();
        Self {
            url,
            properties: LinkProperties {
                safe: record.is_safe(),
                validation: outcome,
                error: outcome.description(),
            },
        }
    }
}

/// Stored state of a short URL.
#[derive(Debug, Serialize)]
pub struct LinkStateResponse {
    pub hash: String,
    pub url: String,
    pub target: String,
    pub created: DateTime<Utc>,
    pub redirect_mode: u16,
    pub validation: ValidationOutcome,
    pub safe: bool,
    pub safety: SafetyState,
    pub block_state: BlockState,
    pub reachable_state: ReachableState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
}

impl LinkStateResponse {
    pub fn new(url: String, record: ShortUrl) -> Self {
        Self {
            validation: record.outcome(),
            safe: record.is_safe(),
            redirect_mode: record.redirect_mode.code(),
            hash: record.hash,
            url,
            target: record.target,
            created: record.created_at,
            safety: record.safety,
            block_state: record.block_state.reported(),
            reachable_state: record.reachable_state,
            sponsor: record.properties.sponsor,
        }
    }
}

/// State plus click history.
#[derive(Debug, Serialize)]
pub struct LinkInfoResponse {
    #[serde(flatten)]
    pub link: LinkStateResponse,
    pub clicks: Vec<ClickInfo>,
}

impl LinkInfoResponse {
    pub fn new(url: String, info: ShortUrlInfo) -> Self {
        Self {
            link: LinkStateResponse::new(url, info.short_url),
            clicks: info.clicks.into_iter().map(ClickInfo::from).collect(),
        }
    }
}

/// One click in the history.
#[derive(Debug, Serialize)]
pub struct ClickInfo {
    pub date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl From<Click> for ClickInfo {
    fn from(click: Click) -> Self {
        Self {
            date: click.created_at,
            browser: click.properties.browser,
            platform: click.properties.platform,
        }
    }
}
