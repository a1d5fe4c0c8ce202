//! Threat lookup against a Safe Browsing v4 compatible `threatMatches:find` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::checkers::{CheckError, SafetyChecker, SafetyVerdict};

pub const DEFAULT_ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

/// Threat types every lookup asks about.
const THREAT_TYPES: [&str; 3] = [
    "MALWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
    "UNWANTED_SOFTWARE",
];

/// Configuration for [`SafeBrowsingChecker`].
#[derive(Debug, Clone)]
pub struct SafeBrowsingConfig {
    pub endpoint: String,
    pub api_key: String,
    pub client_name: String,
    pub client_version: String,
    pub timeout: Duration,
}

impl SafeBrowsingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_name = name.into();
        self.client_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatchesRequest<'a> {
    pub client: ClientInfo<'a>,
    pub threat_info: ThreatInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo<'a> {
    pub client_id: &'a str,
    pub client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo<'a> {
    pub threat_types: Vec<&'static str>,
    pub platform_types: Vec<&'static str>,
    pub threat_entry_types: Vec<&'static str>,
    pub threat_entries: Vec<ThreatEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ThreatEntry<'a> {
    pub url: &'a str,
}

/// Response body. An absent `matches` field means no match.
#[derive(Debug, Default, Deserialize)]
pub struct ThreatMatchesResponse {
    #[serde(default)]
    pub matches: Vec<serde_json::Value>,
}

impl<'a> ThreatMatchesRequest<'a> {
    pub fn for_url(config: &'a SafeBrowsingConfig, url: &'a str) -> Self {
        Self {
            client: ClientInfo {
                client_id: &config.client_name,
                client_version: &config.client_version,
            },
            threat_info: ThreatInfo {
                threat_types: THREAT_TYPES.to_vec(),
                platform_types: vec!["ALL_PLATFORMS"],
                threat_entry_types: vec!["URL"],
                threat_entries: vec![ThreatEntry { url }],
            },
        }
    }
}

/// Client for a `threatMatches:find` endpoint.
#[derive(Debug, Clone)]
pub struct SafeBrowsingChecker {
    config: SafeBrowsingConfig,
    client: Client,
}

impl SafeBrowsingChecker {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: SafeBrowsingConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SafetyChecker for SafeBrowsingChecker {
    async fn check(&self, url: &str) -> Result<SafetyVerdict, CheckError> {
        let body = ThreatMatchesRequest::for_url(&self.config, url);

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| CheckError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::Status(status.as_u16()));
        }

        let parsed: ThreatMatchesResponse = response
            .json()
            .await
            .map_err(|e| CheckError::Decode(e.to_string()))?;

        if parsed.matches.is_empty() {
            Ok(SafetyVerdict::Safe)
        } else {
            tracing::info!(url, matches = parsed.matches.len(), "Threat lookup matched");
            Ok(SafetyVerdict::Unsafe)
        }
    }
}

/// Stand-in used when no API key is configured. Every URL is reported safe.
#[derive(Debug, Clone, Default)]
pub struct DisabledSafetyChecker;

#[async_trait]
impl SafetyChecker for DisabledSafetyChecker {
    async fn check(&self, _url: &str) -> Result<SafetyVerdict, CheckError> {
        Ok(SafetyVerdict::Safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let config = SafeBrowsingConfig::new("key").with_client_info("shortener", "1.2.3");
        let body = ThreatMatchesRequest::for_url(&config, "http://bad.example/");

        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(
            value,
            json!({
                "client": { "clientId": "shortener", "clientVersion": "1.2.3" },
                "threatInfo": {
                    "threatTypes": ["MALWARE", "POTENTIALLY_HARMFUL_APPLICATION", "UNWANTED_SOFTWARE"],
                    "platformTypes": ["ALL_PLATFORMS"],
                    "threatEntryTypes": ["URL"],
                    "threatEntries": [{ "url": "http://bad.example/" }]
                }
            })
        );
    }

    #[test]
    fn test_empty_response_has_no_matches() {
        let parsed: ThreatMatchesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());

        let parsed: ThreatMatchesResponse =
            serde_json::from_str(r#"{"matches":[{"threatType":"MALWARE"}]}"#).unwrap();
        assert_eq!(parsed.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_checker_reports_safe() {
        let verdict = DisabledSafetyChecker.check("http://anything/").await.unwrap();
        assert!(verdict.is_safe());
    }
}
