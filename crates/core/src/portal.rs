//! Portal HTTP plumbing shared by the record and headless-delivery clients.
//!
//! Every request carries the JSON content type (once) and the host's CSRF token. A
//! `204 No Content` reply decodes to `None`; any other non-2xx reply is an error.

use crate::error::PortalError;
use reqwest::{
    RequestBuilder, StatusCode,
    header::{CONTENT_TYPE, HeaderMap},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

pub const FILTER_PARAM: &str = "filter";
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const SORT_PARAM: &str = "sort";
pub const FLATTEN_PARAM: &str = "flatten";
pub const SEARCH_PARAM: &str = "search";

const HEADER_CSRF_TOKEN: &str = "x-csrf-token";
const CONTENT_TYPE_JSON: &str = "application/json";

/// Query parameters as sent on the wire.
pub type QueryParams = Vec<(&'static str, String)>;

/// A thin client bound to one portal origin.
#[derive(Clone, Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    origin: String,
    csrf_token: Option<String>,
}

impl PortalClient {
    /// Creates a client for `origin` (e.g. `https://portal.example.com`).
    pub fn new(origin: impl Into<String>, csrf_token: Option<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), origin, csrf_token)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        origin: impl Into<String>,
        csrf_token: Option<String>,
    ) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self {
            http,
            origin,
            csrf_token,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The underlying connection pool, for clients talking to other hosts.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolves a site-relative path against the portal origin.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }

    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, PortalError> {
        let url = self.url(path);
        debug!(%url, ?params, "GET");
        let builder = self
            .http
            .get(url)
            .query(params)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON);
        self.send(builder).await
    }

    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Option<Value>, PortalError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        // `json` sets the content type itself.
        self.send(self.http.post(url).json(body)).await
    }

    async fn send(&self, mut builder: RequestBuilder) -> Result<Option<Value>, PortalError> {
        if let Some(token) = &self.csrf_token {
            builder = builder.header(HEADER_CSRF_TOKEN, token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let is_json = is_json_response(response.headers());
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PortalError::Status {
                status: status.as_u16(),
                body,
            });
        }
        decode_body(&body, is_json)
    }
}

fn is_json_response(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(CONTENT_TYPE_JSON))
}

/// Non-JSON bodies are kept as a plain string value.
fn decode_body(body: &str, is_json: bool) -> Result<Option<Value>, PortalError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    if is_json {
        Ok(Some(serde_json::from_str(body)?))
    } else {
        Ok(Some(Value::String(body.to_string())))
    }
}

/// `<field>:asc` or `<field>:desc`.
pub fn build_sort(field: &str, ascending: bool) -> String {
    format!("{}:{}", field, if ascending { "asc" } else { "desc" })
}

/// `<field> eq '<value>'`, with single quotes in `value` doubled.
pub fn eq_filter(field: &str, value: &str) -> String {
    format!("{} eq '{}'", field, value.replace('\'', "''"))
}

/// Filtered, sorted, paginated read parameters for the object record API.
pub fn object_search_params(filter: String, page: u32, page_size: u32, sort: String) -> QueryParams {
    vec![
        (FILTER_PARAM, filter),
        (PAGE_PARAM, page.to_string()),
        (PAGE_SIZE_PARAM, page_size.to_string()),
        (SORT_PARAM, sort),
    ]
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_size: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            page_size: 0,
            total_count: 0,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    items: Option<Value>,
    #[serde(default)]
    page_size: u64,
    #[serde(default)]
    total_count: u64,
}

/// Decodes a page reply, warning about shape problems instead of failing.
///
/// Returns `None` when the reply carries no item array at all. Items that do
/// not decode are skipped.
pub fn parse_page<T: DeserializeOwned>(body: Option<Value>) -> Option<Page<T>> {
    let raw = match body.map(serde_json::from_value::<RawPage>) {
        Some(Ok(raw)) => raw,
        _ => {
            warn!("Items is not an array");
            return None;
        }
    };

    let items = match raw.items {
        Some(Value::Array(items)) => items,
        _ => {
            warn!("Items is not an array");
            return None;
        }
    };

    if raw.page_size < raw.total_count {
        warn!(
            returned = raw.page_size,
            total = raw.total_count,
            "The returned set of items is not the full set"
        );
    }
    if items.len() as u64 != raw.page_size {
        warn!(
            returned = items.len(),
            requested = raw.page_size,
            "There are fewer items than requested"
        );
    }

    let items = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "Skipping item with unexpected shape");
                None
            }
        })
        .collect();

    Some(Page {
        items,
        page_size: raw.page_size,
        total_count: raw.total_count,
    })
}
