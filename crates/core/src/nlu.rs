//! NLU Client
//!
//! Sends free-text utterances to a Dialogflow-style intent detection API and
//! returns the structured fulfillment result.

use crate::error::PortalError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Locale tag sent with every utterance.
pub const LANGUAGE_CODE: &str = "en-UK";

pub const DEFAULT_BASE_URL: &str = "https://dialogflow.googleapis.com/v2";

/// The NLU service's structured reply for one utterance.
///
/// Unknown fields are kept so the full result can be stored alongside the
/// response turn.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentResult {
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub fulfillment_messages: Vec<FulfillmentMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FulfillmentResult {
    /// The first line of the first text message, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.fulfillment_messages
            .iter()
            .find_map(|m| m.text.as_ref())
            .and_then(|t| t.text.first())
            .map(String::as_str)
    }

    /// Display summary for the stored response turn; empty when there is no text.
    pub fn summary(&self) -> String {
        self.first_text().unwrap_or_default().to_string()
    }
}

/// A single reply element: plain text or an application payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FulfillmentMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FulfillmentMessage {
    pub fn text(line: impl Into<String>) -> Self {
        Self {
            text: Some(TextMessage {
                text: vec![line.into()],
            }),
            ..Default::default()
        }
    }

    pub fn payload(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TextMessage {
    #[serde(default)]
    pub text: Vec<String>,
}

/// Application-specific payload carried by a fulfillment message.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Payload {
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub search: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Non-string directive values are treated as absent.
fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        _ => None,
    })
}

/// What a structured payload asks the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Redirect(String),
    Search(String),
}

impl Payload {
    /// Redirect wins over search; blank values count as absent.
    pub fn directive(&self) -> Option<Directive> {
        let present = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        present(&self.redirect)
            .map(Directive::Redirect)
            .or_else(|| present(&self.search).map(Directive::Search))
    }
}

#[derive(Serialize, Debug)]
struct DetectIntentRequest<'a> {
    query_input: QueryInput<'a>,
}

#[derive(Serialize, Debug)]
struct QueryInput<'a> {
    text: TextInput<'a>,
}

#[derive(Serialize, Debug)]
struct TextInput<'a> {
    text: &'a str,
    language_code: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DetectIntentResponse {
    query_result: Option<FulfillmentResult>,
}

/// A service that maps an utterance to an intent and its fulfillment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentDetector: Send + Sync {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<FulfillmentResult>;
}

/// `IntentDetector` backed by the Dialogflow v2 REST API.
pub struct DialogflowClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl DialogflowClient {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            access_token: access_token.into(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Points the client at a different API root (e.g. a regional endpoint).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn session_url(&self, session_id: &str) -> String {
        format!(
            "{}/projects/{}/agent/sessions/{}:detectIntent",
            self.base_url, self.project_id, session_id
        )
    }
}

#[async_trait]
impl IntentDetector for DialogflowClient {
    async fn detect_intent(&self, session_id: &str, text: &str) -> Result<FulfillmentResult> {
        let request = DetectIntentRequest {
            query_input: QueryInput {
                text: TextInput {
                    text,
                    language_code: LANGUAGE_CODE,
                },
            },
        };
        debug!(?request, "Sending detectIntent request");

        let response = self
            .http
            .post(self.session_url(session_id))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(PortalError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body: DetectIntentResponse = response.json().await.map_err(PortalError::from)?;
        body.query_result
            .context("detectIntent response carried no queryResult")
    }
}
