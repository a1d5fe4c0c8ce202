//! Bearer token check for the administrative endpoints.

use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Authenticates administrative requests against the configured token.
///
/// Only the HMAC-SHA256 of the admin token (keyed by `signing_secret`) is
/// kept in memory, and presented tokens are compared through
/// [`Mac::verify_slice`], which runs in constant time. Without a configured
/// token every request is rejected.
pub struct AuthService {
    admin_token_mac: Option<Vec<u8>>,
    signing_secret: String,
}

impl AuthService {
    /// # Arguments
    ///
    /// - `admin_token` - accepted bearer token; `None` disables admin access
    /// - `signing_secret` - HMAC key used for the comparison
    pub fn new(admin_token: Option<String>, signing_secret: String) -> Self {
        let admin_token_mac = admin_token
            .filter(|t| !t.is_empty())
            .and_then(|t| sign(&signing_secret, &t));

        Self {
            admin_token_mac,
            signing_secret,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.admin_token_mac.is_some()
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if `token` is not the admin token
    /// or admin access is disabled.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        let Some(expected) = &self.admin_token_mac else {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Administrative access is disabled" }),
            ));
        };

        let valid = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map(|mut mac| {
                mac.update(token.as_bytes());
                mac.verify_slice(expected).is_ok()
            })
            .unwrap_or(false);

        if !valid {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid token" }),
            ));
        }

        Ok(())
    }
}

fn sign(secret: &str, token: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(token.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(token: Option<&str>) -> AuthService {
        AuthService::new(token.map(str::to_string), "test-signing-secret".to_string())
    }

    #[test]
    fn test_authenticate_success() {
        let service = service(Some("valid-token"));

        assert!(service.is_enabled());
        assert!(service.authenticate("valid-token").is_ok());
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let service = service(Some("valid-token"));

        let result = service.authenticate("invalid-token");

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_authenticate_without_admin_token() {
        let service = service(None);

        assert!(!service.is_enabled());
        assert!(service.authenticate("").is_err());
        assert!(service.authenticate("anything").is_err());
    }

    #[test]
    fn test_empty_admin_token_disables_access() {
        assert!(!service(Some("")).is_enabled());
    }
}
