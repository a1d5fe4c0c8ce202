//! Click event model for asynchronous click tracking.

use crate::domain::entities::NewClick;

/// An in-memory representation of a redirect, queued for the click worker.
///
/// The redirect handler builds one of these and hands it to a bounded
/// channel with `try_send`, so recording a click never delays the redirect
/// response. When the channel is full the event is dropped.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler from request metadata
/// 2. Sent to the channel (non-blocking)
/// 3. Processed by [`crate::domain::click_worker::run_click_worker`]
/// 4. Converted to [`NewClick`] for persistence; the user agent is parsed
///    afterwards by a detached follow-up
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub hash: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl ClickEvent {
    /// Creates a new click event.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(
    ///     "a1B2c3D4e5F6".to_string(),
    ///     Some("192.168.1.1".to_string()),
    ///     Some("Mozilla/5.0"),
    ///     Some("https://google.com"),
    /// );
    /// ```
    pub fn new(
        hash: String,
        ip: Option<String>,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Self {
        Self {
            hash,
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referrer: referrer.map(|s| s.to_string()),
        }
    }

    /// Persistable part of the event. The user agent is not stored raw.
    pub fn to_new_click(&self) -> NewClick {
        NewClick {
            hash: self.hash.clone(),
            ip: self.ip.clone(),
            referrer: self.referrer.clone(),
        }
    }
}
