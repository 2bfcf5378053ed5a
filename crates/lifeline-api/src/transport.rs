// Shared transport configuration for building reqwest::Client instances.
//
// The REST store and the OAuth helper share timeout and header settings
// through this module, avoiding duplicated builder logic.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Anon key sent as both `apikey` and `Authorization: Bearer` headers.
    /// `None` for clients that talk to third-party endpoints (OAuth).
    pub api_key: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// When an API key is set it is injected as default headers so every
    /// request carries it without per-call plumbing.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();

        if let Some(ref key) = self.api_key {
            let value = HeaderValue::from_str(key.expose_secret()).map_err(|_| {
                crate::error::Error::Authentication {
                    message: "API key contains characters not valid in an HTTP header".into(),
                }
            })?;
            let mut bearer =
                HeaderValue::from_str(&format!("Bearer {}", key.expose_secret())).map_err(
                    |_| crate::error::Error::Authentication {
                        message: "API key contains characters not valid in an HTTP header".into(),
                    },
                )?;
            bearer.set_sensitive(true);

            headers.insert("apikey", value);
            headers.insert(reqwest::header::AUTHORIZATION, bearer);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("lifeline/0.1.0")
            .default_headers(headers)
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
