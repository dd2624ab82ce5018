//! Acquisition of the bearer token used by the NLU client.

use crate::config::TokenSource;
use anyhow::{Context, Result, anyhow};
use askray_core::portal::PortalClient;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A token supplied up front.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Exchanges an OAuth client reference for a token through the portal backend.
pub struct BackendTokenProvider {
    portal: PortalClient,
    path: String,
}

impl BackendTokenProvider {
    pub fn new(portal: PortalClient, auth_endpoint: &str, oauth2_client_erc: &str) -> Self {
        let path = format!(
            "{}/{}",
            auth_endpoint.trim_end_matches('/'),
            oauth2_client_erc
        );
        Self { portal, path }
    }
}

#[async_trait]
impl AccessTokenProvider for BackendTokenProvider {
    async fn access_token(&self) -> Result<String> {
        debug!(path = %self.path, "Requesting access token");
        let body = self
            .portal
            .get_json(&self.path, &[])
            .await
            .context("Access token exchange failed")?;
        let token = token_from_body(body)?;
        info!("Access token acquired");
        Ok(token)
    }
}

/// Accepts `{"accessToken": ..}`, `{"access_token": ..}` or a bare string body.
fn token_from_body(body: Option<Value>) -> Result<String> {
    let token = match body {
        Some(Value::String(token)) => Some(token.trim().to_string()),
        Some(Value::Object(map)) => map
            .get("accessToken")
            .or_else(|| map.get("access_token"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("Access token response carried no token"))
}

/// Builds the provider matching the configured token source.
pub fn token_provider(source: &TokenSource, portal: PortalClient) -> Box<dyn AccessTokenProvider> {
    match source {
        TokenSource::Static(token) => Box::new(StaticToken::new(token.clone())),
        TokenSource::Backend {
            auth_endpoint,
            oauth2_client_erc,
        } => Box::new(BackendTokenProvider::new(
            portal,
            auth_endpoint,
            oauth2_client_erc,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_from_body_shapes() {
        assert_eq!(
            token_from_body(Some(json!({"accessToken": "abc"}))).unwrap(),
            "abc"
        );
        assert_eq!(
            token_from_body(Some(json!({"access_token": "def"}))).unwrap(),
            "def"
        );
        assert_eq!(
            token_from_body(Some(Value::String(" ghi\n".into()))).unwrap(),
            "ghi"
        );
    }

    #[test]
    fn test_token_from_body_rejects_missing_token() {
        assert!(token_from_body(None).is_err());
        assert!(token_from_body(Some(json!({"expires": 10}))).is_err());
        assert!(token_from_body(Some(Value::String(String::new()))).is_err());
    }

    #[test]
    fn test_backend_path() {
        let provider = BackendTokenProvider::new(
            PortalClient::new("https://portal.test", None),
            "/o/google-auth/token/",
            "dialogflow-client",
        );
        assert_eq!(provider.path, "/o/google-auth/token/dialogflow-client");
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = token_provider(
            &TokenSource::Static("t-1".into()),
            PortalClient::new("https://portal.test", None),
        );
        assert_eq!(provider.access_token().await.unwrap(), "t-1");
    }
}
