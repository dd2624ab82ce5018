//! Lookup of portal-managed fulfilment records for a detected intent.

use crate::portal::{Page, PortalClient, build_sort, eq_filter, object_search_params, parse_page};
use crate::transcript::{DEFAULT_MAX_ENTRIES, object_path};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

const FULFILMENT_SORT_FIELD: &str = "priority";
const INTENT_FIELD: &str = "intent";

/// A fulfilment record; fields beyond the intent and priority are kept as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IntentFulfilment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

pub struct IntentFulfilmentClient {
    portal: PortalClient,
    path: String,
    max_entries: u32,
}

impl IntentFulfilmentClient {
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

    fn params(&self, intent: &str) -> Vec<(&'static str, String)> {
        object_search_params(
            eq_filter(INTENT_FIELD, intent),
            1,
            self.max_entries,
            build_sort(FULFILMENT_SORT_FIELD, false),
        )
    }

    /// Highest-priority fulfilment records for `intent`.
    pub async fn fetch(&self, intent: &str) -> Result<Option<Page<IntentFulfilment>>> {
        debug!(path = %self.path, %intent, "Retrieving intent fulfilment");
        let body = self.portal.get_json(&self.path, &self.params(intent)).await?;
        Ok(parse_page(body))
    }
}
