//! Destination URL checks and normalization.
//!
//! Only absolute `http`/`https` URLs with a host can be shortened. Accepted
//! URLs are stored in a canonical form so block-list matching sees the same
//! spelling regardless of how the URL was submitted.

use url::Url;

/// Reasons a destination URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetUrlError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL has no host")]
    MissingHost,

    #[error("Failed to normalize URL: {0}")]
    NormalizationFailed(String),
}

/// Normalizes a destination URL to its canonical form.
///
/// # Normalization Rules
///
/// 1. **Protocol**: only HTTP and HTTPS are allowed
/// 2. **Hostname**: lowercased
/// 3. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 4. **Fragments**: removed
/// 5. **Path and query**: preserved as-is
///
/// # Errors
///
/// Returns a [`TargetUrlError`] describing the first rule the input breaks.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, TargetUrlError> {
    let mut url =
        Url::parse(input.trim()).map_err(|e| TargetUrlError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TargetUrlError::UnsupportedProtocol);
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or(TargetUrlError::MissingHost)?
        .to_ascii_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| TargetUrlError::NormalizationFailed(e.to_string()))?;

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        url.set_port(None).map_err(|_| {
            TargetUrlError::NormalizationFailed("Failed to remove default port".to_string())
        })?;
    }

    Ok(url.to_string())
}

/// Quick screen used by the bulk import before attempting a full parse.
pub fn looks_like_http_url(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Joins the public base URL and a hash.
pub fn short_url(base_url: &str, hash: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_root_path() {
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com/");
    }

    #[test]
    fn test_normalize_lowercases_host_only() {
        assert_eq!(
            normalize_url("https://ExAmPlE.CoM/Path?Q=1").unwrap(),
            "https://example.com/Path?Q=1"
        );
    }

    #[test]
    fn test_normalize_strips_default_port_and_fragment() {
        assert_eq!(
            normalize_url("https://example.com:443/page#section").unwrap(),
            "https://example.com/page"
        );
        assert_eq!(
            normalize_url("http://example.com:8080/").unwrap(),
            "http://example.com:8080/"
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(
            normalize_url("ftp://example.com/file").unwrap_err(),
            TargetUrlError::UnsupportedProtocol
        );
        assert_eq!(
            normalize_url("javascript:alert(1)").unwrap_err(),
            TargetUrlError::UnsupportedProtocol
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            normalize_url("not-a-url"),
            Err(TargetUrlError::InvalidFormat(_))
        ));
        assert!(normalize_url("").is_err());
    }

    #[test]
    fn test_looks_like_http_url() {
        assert!(looks_like_http_url("https://a.example/"));
        assert!(looks_like_http_url("HTTP://A.EXAMPLE/"));
        assert!(!looks_like_http_url("not-a-url"));
        assert!(!looks_like_http_url("ftp://a.example/"));
    }

    #[test]
    fn test_short_url_joins_without_double_slash() {
        assert_eq!(short_url("http://localhost:3000/", "abc"), "http://localhost:3000/abc");
        assert_eq!(short_url("https://s.example", "abc"), "https://s.example/abc");
    }
}
