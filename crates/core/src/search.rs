//! Content Search Client
//!
//! Queries the headless-delivery structured-content search, scoped either to
//! the site or to one asset library, and turns hits into display cards.

use crate::host::HostEnvironment;
use crate::portal::{FLATTEN_PARAM, Page, PortalClient, SEARCH_PARAM, parse_page};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Cards kept per search.
pub const MAX_SEARCH_RESULTS: usize = 3;

/// Where a structured-content search runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    Site { group_id: String },
    AssetLibrary { id: String },
}

impl SearchScope {
    /// The asset library when one is configured, otherwise the host's current site.
    pub fn resolve(asset_library_id: Option<&str>, host: &dyn HostEnvironment) -> Option<Self> {
        match (asset_library_id, host.site_group_id()) {
            (Some(id), _) => Some(SearchScope::AssetLibrary { id: id.to_string() }),
            (None, Some(group_id)) => Some(SearchScope::Site {
                group_id: group_id.to_string(),
            }),
            (None, None) => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            SearchScope::Site { group_id } => format!(
                "/o/headless-delivery/v1.0/sites/{}/structured-contents",
                group_id
            ),
            SearchScope::AssetLibrary { id } => format!(
                "/o/headless-delivery/v1.0/asset-libraries/{}/structured-contents",
                id
            ),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredContent {
    #[serde(default)]
    pub content_fields: Vec<ContentField>,
    #[serde(default)]
    pub friendly_url_path: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_field_value: Option<ContentFieldValue>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ContentFieldValue {
    #[serde(default)]
    pub data: Option<Value>,
}

impl ContentField {
    /// The field's value rendered as text; empty when absent.
    pub fn text(&self) -> String {
        match self.content_field_value.as_ref().and_then(|v| v.data.as_ref()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// A display card built from one search hit.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub description: String,
    pub friendly_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardAttribute {
    Title,
    Description,
}

/// Recognised field names, highest priority first within each attribute.
const FIELD_SYNONYMS: &[(&str, CardAttribute)] = &[
    ("title", CardAttribute::Title),
    ("question", CardAttribute::Title),
    ("description", CardAttribute::Description),
    ("header", CardAttribute::Description),
    ("shortanswer", CardAttribute::Description),
];

fn classify(field_name: &str) -> Option<(CardAttribute, usize)> {
    let lowered = field_name.to_lowercase();
    FIELD_SYNONYMS
        .iter()
        .enumerate()
        .find(|(_, (name, _))| *name == lowered)
        .map(|(rank, (_, attribute))| (*attribute, rank))
}

/// Builds a card from an item's fields.
///
/// Each attribute takes the value of its highest-priority synonym; among
/// fields with the same name the first one wins.
pub fn extract_result(item: &StructuredContent) -> SearchResult {
    let mut title: Option<(usize, String)> = None;
    let mut description: Option<(usize, String)> = None;

    for field in &item.content_fields {
        let Some((attribute, rank)) = field.name.as_deref().and_then(classify) else {
            continue;
        };
        let slot = match attribute {
            CardAttribute::Title => &mut title,
            CardAttribute::Description => &mut description,
        };
        if slot.as_ref().is_none_or(|(best, _)| rank < *best) {
            *slot = Some((rank, field.text()));
        }
    }

    SearchResult {
        title: title.map(|(_, v)| v).unwrap_or_default(),
        description: description.map(|(_, v)| v).unwrap_or_default(),
        friendly_url: item.friendly_url_path.clone(),
    }
}

/// Cards for the first [`MAX_SEARCH_RESULTS`] hits.
pub fn extract_results(items: &[StructuredContent]) -> Vec<SearchResult> {
    items
        .iter()
        .take(MAX_SEARCH_RESULTS)
        .map(extract_result)
        .collect()
}

/// A structured-content search service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSearch: Send + Sync {
    async fn search(&self, phrase: &str) -> Result<Option<Page<StructuredContent>>>;
}

/// `ContentSearch` over the portal headless-delivery API.
pub struct HeadlessContentSearch {
    portal: PortalClient,
    scope: SearchScope,
}

impl HeadlessContentSearch {
    pub fn new(portal: PortalClient, scope: SearchScope) -> Self {
        Self { portal, scope }
    }
}

fn search_params(phrase: &str) -> Vec<(&'static str, String)> {
    vec![
        (FLATTEN_PARAM, "true".to_string()),
        (SEARCH_PARAM, phrase.to_string()),
    ]
}

#[async_trait]
impl ContentSearch for HeadlessContentSearch {
    async fn search(&self, phrase: &str) -> Result<Option<Page<StructuredContent>>> {
        let path = self.scope.path();
        debug!(%path, %phrase, "Searching structured contents");
        let body = self.portal.get_json(&path, &search_params(phrase)).await?;
        Ok(parse_page(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, data: &str) -> ContentField {
        ContentField {
            name: Some(name.to_string()),
            content_field_value: Some(ContentFieldValue {
                data: Some(Value::String(data.to_string())),
            }),
        }
    }

    #[test]
    fn test_scope_paths() {
        assert_eq!(
            SearchScope::Site {
                group_id: "20121".into()
            }
            .path(),
            "/o/headless-delivery/v1.0/sites/20121/structured-contents"
        );
        assert_eq!(
            SearchScope::AssetLibrary { id: "555".into() }.path(),
            "/o/headless-delivery/v1.0/asset-libraries/555/structured-contents"
        );
    }

    struct SiteHost(Option<&'static str>);

    impl HostEnvironment for SiteHost {
        fn is_signed_in(&self) -> bool {
            true
        }
        fn user_identity(&self) -> &str {
            "ray@example.com"
        }
        fn origin(&self) -> &str {
            "https://portal.example.com"
        }
        fn site_group_id(&self) -> Option<&str> {
            self.0
        }
        fn csrf_token(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_scope_resolution() {
        assert_eq!(
            SearchScope::resolve(Some("555"), &SiteHost(Some("20121"))),
            Some(SearchScope::AssetLibrary { id: "555".into() })
        );
        assert_eq!(
            SearchScope::resolve(None, &SiteHost(Some("20121"))),
            Some(SearchScope::Site {
                group_id: "20121".into()
            })
        );
        assert_eq!(SearchScope::resolve(None, &SiteHost(None)), None);
    }

    #[test]
    fn test_search_params() {
        assert_eq!(
            search_params("refund policy"),
            vec![
                ("flatten", "true".to_string()),
                ("search", "refund policy".to_string())
            ]
        );
    }

    #[test]
    fn test_title_beats_question_regardless_of_order() {
        let item = StructuredContent {
            content_fields: vec![field("Question", "Q?"), field("TITLE", "The title")],
            friendly_url_path: "refunds".into(),
        };
        let card = extract_result(&item);
        assert_eq!(card.title, "The title");
        assert_eq!(card.friendly_url, "refunds");
    }

    #[test]
    fn test_description_priority() {
        let item = StructuredContent {
            content_fields: vec![
                field("shortAnswer", "short"),
                field("header", "head"),
                field("description", "desc"),
            ],
            ..Default::default()
        };
        assert_eq!(extract_result(&item).description, "desc");

        let item = StructuredContent {
            content_fields: vec![field("shortanswer", "short"), field("Header", "head")],
            ..Default::default()
        };
        assert_eq!(extract_result(&item).description, "head");
    }

    #[test]
    fn test_first_field_with_same_name_wins() {
        let item = StructuredContent {
            content_fields: vec![field("title", "first"), field("title", "second")],
            ..Default::default()
        };
        assert_eq!(extract_result(&item).title, "first");
    }

    #[test]
    fn test_unmatched_attributes_stay_empty() {
        let item = StructuredContent {
            content_fields: vec![
                field("body", "ignored"),
                ContentField {
                    name: None,
                    content_field_value: None,
                },
            ],
            ..Default::default()
        };
        let card = extract_result(&item);
        assert_eq!(card.title, "");
        assert_eq!(card.description, "");
    }

    #[test]
    fn test_extract_results_caps_at_three() {
        let items: Vec<StructuredContent> = (0..5)
            .map(|i| StructuredContent {
                content_fields: vec![field("title", &format!("t{i}"))],
                friendly_url_path: format!("u{i}"),
            })
            .collect();
        let cards = extract_results(&items);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[2].title, "t2");
        assert_eq!(extract_results(&items[..1]).len(), 1);
        assert!(extract_results(&[]).is_empty());
    }

    #[test]
    fn test_decodes_flattened_item() {
        let item: StructuredContent = serde_json::from_value(json!({
            "id": 1,
            "friendlyUrlPath": "refund-policy",
            "contentFields": [
                {"name": "title", "contentFieldValue": {"data": "Refunds"}, "dataType": "string"},
                {"name": "rank", "contentFieldValue": {"data": 3}}
            ]
        }))
        .unwrap();
        assert_eq!(item.friendly_url_path, "refund-policy");
        assert_eq!(item.content_fields[0].text(), "Refunds");
        assert_eq!(item.content_fields[1].text(), "3");
    }
}
