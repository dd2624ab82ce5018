//! Transcript Store Client
//!
//! Reads and appends conversation turns through the portal's generic object
//! record API (`/o/c/<endpoint>`). Turns are append-only; reads come back
//! newest-first and must be reversed for display.

use crate::nlu::FulfillmentResult;
use crate::portal::{Page, PortalClient, build_sort, eq_filter, object_search_params, parse_page};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

pub const DEFAULT_MAX_ENTRIES: u32 = 7;

const CHAT_SORT_FIELD: &str = "id";
const SESSION_ID_FIELD: &str = "sessionId";

/// Path of an object record endpoint.
pub fn object_path(endpoint: &str) -> String {
    format!("/o/c/{}", endpoint.trim_matches('/'))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnType {
    Query,
    Response,
}

/// Writes send the plain key; reads may return a picklist object instead.
#[derive(Deserialize)]
#[serde(untagged)]
enum TurnTypeRepr {
    Plain(TurnType),
    Picklist { key: TurnType },
}

fn deserialize_turn_type<'de, D>(deserializer: D) -> Result<TurnType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TurnTypeRepr::deserialize(deserializer)? {
        TurnTypeRepr::Plain(t) | TurnTypeRepr::Picklist { key: t } => t,
    })
}

/// One recorded conversational event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub id: u64,
    #[serde(default)]
    pub session_id: String,
    #[serde(rename = "type", deserialize_with = "deserialize_turn_type")]
    pub turn_type: TurnType,
    #[serde(default)]
    pub fulfilment_message: String,
}

/// Reorders a newest-first page into display (oldest-first) order.
pub fn chronological(mut turns: Vec<ConversationTurn>) -> Vec<ConversationTurn> {
    turns.reverse();
    turns
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QueryRecord<'a> {
    #[serde(rename = "type")]
    turn_type: TurnType,
    session_id: &'a str,
    fulfilment_message: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponseRecord<'a> {
    #[serde(rename = "type")]
    turn_type: TurnType,
    session_id: &'a str,
    query: &'a str,
    action: &'a str,
    fulfilment_message: String,
    response: &'a FulfillmentResult,
}

/// Persistence for the conversation transcript.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Newest-first page of turns for `session_id`; `None` when the reply had no item array.
    async fn fetch_recent(&self, session_id: &str) -> Result<Option<Page<ConversationTurn>>>;

    /// Appends a `query` turn.
    async fn record_query(&self, session_id: &str, text: &str) -> Result<()>;

    /// Appends a `response` turn summarised by the first text message.
    async fn record_response(&self, session_id: &str, result: &FulfillmentResult) -> Result<()>;
}

/// `TranscriptStore` over the portal object record API.
pub struct ObjectTranscriptStore {
    portal: PortalClient,
    path: String,
    max_entries: u32,
}

impl ObjectTranscriptStore {
    /// A `max_entries` of zero falls back to the default page size.
    pub fn new(portal: PortalClient, endpoint: &str, max_entries: u32) -> Self {
        let max_entries = if max_entries == 0 {
            DEFAULT_MAX_ENTRIES
        } else {
            max_entries
        };
        Self {
            portal,
            path: object_path(endpoint),
            max_entries,
        }
    }

    pub fn max_entries(&self) -> u32 {
        self.max_entries
    }

    fn recent_params(&self, session_id: &str) -> Vec<(&'static str, String)> {
        object_search_params(
            eq_filter(SESSION_ID_FIELD, session_id),
            1,
            self.max_entries,
            build_sort(CHAT_SORT_FIELD, false),
        )
    }
}

#[async_trait]
impl TranscriptStore for ObjectTranscriptStore {
    async fn fetch_recent(&self, session_id: &str) -> Result<Option<Page<ConversationTurn>>> {
        debug!(path = %self.path, max_entries = self.max_entries, "Fetching recent conversation");
        let body = self
            .portal
            .get_json(&self.path, &self.recent_params(session_id))
            .await?;
        Ok(parse_page(body))
    }

    async fn record_query(&self, session_id: &str, text: &str) -> Result<()> {
        let record = QueryRecord {
            turn_type: TurnType::Query,
            session_id,
            fulfilment_message: text,
        };
        self.portal.post_json(&self.path, &record).await?;
        Ok(())
    }

    async fn record_response(&self, session_id: &str, result: &FulfillmentResult) -> Result<()> {
        let record = response_record(session_id, result);
        debug!(path = %self.path, summary = %record.fulfilment_message, "Recording response");
        self.portal.post_json(&self.path, &record).await?;
        Ok(())
    }
}

fn response_record<'a>(session_id: &'a str, result: &'a FulfillmentResult) -> ResponseRecord<'a> {
    ResponseRecord {
        turn_type: TurnType::Response,
        session_id,
        query: &result.query_text,
        action: &result.action,
        fulfilment_message: result.summary(),
        response: result,
    }
}
