//! User-agent parsing for click metadata.

use woothee::parser::Parser;

/// Browser and platform detected from a `User-Agent` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub platform: Option<String>,
}

/// Parses a raw `User-Agent` value.
///
/// Returns `None` when neither the browser nor the platform is recognised.
pub fn parse_user_agent(raw: &str) -> Option<ParsedUserAgent> {
    let result = Parser::new().parse(raw)?;

    let known = |value: &str| {
        if value.is_empty() || value == "UNKNOWN" {
            None
        } else {
            Some(value.to_string())
        }
    };

    let parsed = ParsedUserAgent {
        browser: known(&result.name),
        platform: known(&result.os),
    };

    if parsed.browser.is_none() && parsed.platform.is_none() {
        None
    } else {
        Some(parsed)
    }
}
