use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::IdentityConfig;
use crate::identity::{AuthOutcome, Identity, IdentityError, IdentityProvider, RequestContext};

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ProviderEmail>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderEmail {
    email_address: String,
}

impl From<ProviderUser> for Identity {
    fn from(user: ProviderUser) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            email_addresses: user
                .email_addresses
                .into_iter()
                .map(|e| e.email_address)
                .collect(),
            image_url: user.image_url.unwrap_or_default(),
        }
    }
}

/// Asks the auth provider's HTTP API who owns a session token.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.into()))
            .user_agent(concat!("onboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build identity HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_user(&self, ctx: &RequestContext) -> Result<AuthOutcome, IdentityError> {
        let Some(token) = ctx.session_token.as_deref() else {
            return Ok(AuthOutcome::Unauthenticated);
        };

        let url = format!("{}/v1/me", self.base_url);
        let mut request = self.client.get(&url).bearer_auth(token);
        if let Some(secret) = &self.secret_key {
            request = request.header("X-Api-Key", secret);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let user: ProviderUser = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Decode(e.to_string()))?;
                debug!(user_id = %user.id, "Identity provider resolved session");
                Ok(AuthOutcome::Authenticated(user.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                debug!(status = status.as_u16(), "Session rejected by identity provider");
                Ok(AuthOutcome::Unauthenticated)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), "Identity provider error: {message}");
                Err(IdentityError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer, secret_key: Option<&str>) -> HttpIdentityProvider {
        let config = IdentityConfig {
            base_url: server.uri(),
            secret_key: secret_key.map(str::to_string),
            ..IdentityConfig::default()
        };
        HttpIdentityProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_authenticated_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("Authorization", "Bearer sess_123"))
            .and(header("X-Api-Key", "sk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u1",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email_addresses": [{ "email_address": "ada@x.com" }],
                "image_url": "http://img/a"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("sk_test"));
        let outcome = provider
            .current_user(&RequestContext::with_session("sess_123"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            AuthOutcome::Authenticated(Identity {
                id: "u1".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email_addresses: vec!["ada@x.com".to_string()],
                image_url: "http://img/a".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_missing_optional_fields_default_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u2",
                "first_name": null
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let AuthOutcome::Authenticated(identity) = provider
            .current_user(&RequestContext::with_session("t"))
            .await
            .unwrap()
        else {
            panic!("expected an authenticated identity");
        };

        assert_eq!(identity.id, "u2");
        assert!(identity.first_name.is_empty());
        assert!(identity.email_addresses.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_session_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let outcome = provider
            .current_user(&RequestContext::with_session("expired"))
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::Unauthenticated);
    }

    #[tokio::test]
    async fn test_no_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let outcome = provider
            .current_user(&RequestContext::anonymous())
            .await
            .unwrap();

        assert_eq!(outcome, AuthOutcome::Unauthenticated);
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let err = provider
            .current_user(&RequestContext::with_session("t"))
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let err = provider
            .current_user(&RequestContext::with_session("t"))
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::Decode(_)));
    }
}
