//! OAuth sign-in helpers (authorization-code flow).
//!
//! The identity provider is Discord-shaped but fully configurable: the
//! authorize, token, and identity endpoints all come from config.
//!
//! Every sign-in attempt carries a fresh CSRF `state`. A callback whose
//! `state` does not match the attempt it claims to answer is discarded
//! with [`Error::StateMismatch`] -- a stale or forged redirect must
//! never complete a session.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Config ───────────────────────────────────────────────────────────

/// Endpoints and client identity for the OAuth provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub redirect_uri: Url,
    pub authorize_endpoint: Url,
    pub token_endpoint: Url,
    pub identity_endpoint: Url,
    pub scope: String,
}

impl OAuthConfig {
    /// Standard Discord endpoints with the `identify` scope.
    pub fn discord(client_id: String, redirect_uri: Url) -> Result<Self, Error> {
        Ok(Self {
            client_id,
            redirect_uri,
            authorize_endpoint: Url::parse("https://discord.com/oauth2/authorize")?,
            token_endpoint: Url::parse("https://discord.com/api/oauth2/token")?,
            identity_endpoint: Url::parse("https://discord.com/api/users/@me")?,
            scope: "identify".to_owned(),
        })
    }
}

// ── Attempt state ────────────────────────────────────────────────────

/// An in-flight sign-in attempt. Holds the CSRF state the callback
/// must echo back.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    state: String,
}

impl AuthAttempt {
    pub fn state(&self) -> &str {
        &self.state
    }
}

// ── Identity ─────────────────────────────────────────────────────────

/// The provider's view of the signed-in user.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthIdentity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth client for one provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, transport: &TransportConfig) -> Result<Self, Error> {
        // The provider gets no backend API key.
        let transport = TransportConfig {
            timeout: transport.timeout,
            api_key: None,
        };
        Ok(Self {
            config,
            client: transport.build_client()?,
        })
    }

    /// Start a sign-in attempt: build the authorize URL the user must
    /// visit, and the attempt record the callback is checked against.
    pub fn begin(&self) -> (Url, AuthAttempt) {
        let state = Uuid::new_v4().to_string();

        let mut url = self.config.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope)
            .append_pair("state", &state);

        (url, AuthAttempt { state })
    }

    /// Validate a provider callback and extract the authorization code.
    pub fn parse_callback(&self, attempt: &AuthAttempt, callback: &Url) -> Result<String, Error> {
        let mut code = None;
        let mut state = None;
        let mut error = None;

        for (key, value) in callback.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                "error" => error = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(reason) = error {
            return Err(Error::ConsentDenied { reason });
        }
        if state.as_deref() != Some(attempt.state()) {
            return Err(Error::StateMismatch);
        }
        code.ok_or(Error::Authentication {
            message: "callback carried neither a code nor an error".into(),
        })
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange(
        &self,
        code: &str,
        client_secret: &SecretString,
    ) -> Result<SecretString, Error> {
        let response = self
            .client
            .post(self.config.token_endpoint.clone())
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", &self.config.client_id),
                ("client_secret", client_secret.expose_secret()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExchangeFailed {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("token response: {e}"),
                body,
            })?;
        Ok(SecretString::from(token.access_token))
    }

    /// Fetch the signed-in user's identity with a bearer token.
    pub async fn identity(&self, access_token: &SecretString) -> Result<OAuthIdentity, Error> {
        let response = self
            .client
            .get(self.config.identity_endpoint.clone())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("identity fetch rejected (HTTP {})", status.as_u16()),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("identity response: {e}"),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn client() -> OAuthClient {
        let config = OAuthConfig::discord(
            "client123".into(),
            Url::parse("https://app.example/callback").unwrap(),
        )
        .unwrap();
        OAuthClient::new(config, &TransportConfig::default()).unwrap()
    }

    #[test]
    fn begin_embeds_a_fresh_state_each_time() {
        let client = client();
        let (url_a, attempt_a) = client.begin();
        let (_, attempt_b) = client.begin();

        assert_ne!(attempt_a.state(), attempt_b.state());
        assert!(url_a.query().unwrap().contains("response_type=code"));
        assert!(url_a.query().unwrap().contains(attempt_a.state()));
    }

    #[test]
    fn callback_with_matching_state_yields_code() {
        let client = client();
        let (_, attempt) = client.begin();

        let callback = Url::parse(&format!(
            "https://app.example/callback?code=abc123&state={}",
            attempt.state()
        ))
        .unwrap();

        let code = client.parse_callback(&attempt, &callback).unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn callback_with_wrong_state_is_discarded() {
        let client = client();
        let (_, attempt) = client.begin();

        let callback =
            Url::parse("https://app.example/callback?code=abc123&state=stale").unwrap();

        assert!(matches!(
            client.parse_callback(&attempt, &callback),
            Err(Error::StateMismatch)
        ));
    }

    #[test]
    fn callback_with_error_reports_consent_denied() {
        let client = client();
        let (_, attempt) = client.begin();

        let callback = Url::parse(&format!(
            "https://app.example/callback?error=access_denied&state={}",
            attempt.state()
        ))
        .unwrap();

        assert!(matches!(
            client.parse_callback(&attempt, &callback),
            Err(Error::ConsentDenied { reason }) if reason == "access_denied"
        ));
    }
}
