//! Site-relative link building for redirects, actions and search cards.

use regex::Regex;
use std::sync::LazyLock;

/// Marker identifying URLs written for the legacy site.
pub const LEGACY_SITE_MARKER: &str = "liferaybotics";

const LEGACY_PREFIXES: [&str; 2] = ["/web/liferaybotics", "/group/liferaybotics"];

/// Symbolic NLU actions with a fixed site path.
const ACTION_PATHS: &[(&str, &str)] = &[("blog", "/blogs")];

static DUPLICATE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:]/)/+").expect("Invalid separator regex"));

/// Strips legacy `/web/<app>` or `/group/<app>` prefixes from a redirect.
///
/// A URL carrying the legacy marker without either prefix yields an empty
/// path, which resolves to the site root.
pub fn clean_redirect(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if !url.contains(LEGACY_SITE_MARKER) {
        return url.to_string();
    }
    LEGACY_PREFIXES
        .iter()
        .find(|prefix| url.contains(**prefix))
        .map(|prefix| url.replacen(*prefix, "", 1))
        .unwrap_or_default()
}

/// Collapses repeated `/` except directly after a scheme's `:`.
pub fn collapse_separators(url: &str) -> String {
    DUPLICATE_SEPARATORS.replace_all(url, "${1}").into_owned()
}

/// Builds absolute links under the configured site path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLinks {
    origin: String,
    site_url: String,
}

impl SiteLinks {
    pub fn new(origin: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            site_url: site_url.into(),
        }
    }

    /// `<origin><siteUrl><path>` without doubled separators.
    pub fn build(&self, path: &str) -> String {
        collapse_separators(&format!("{}{}{}", self.origin, self.site_url, path))
    }

    /// Resolves an NLU redirect payload to an absolute link.
    pub fn redirect(&self, target: &str) -> String {
        self.build(&clean_redirect(target))
    }

    /// Link for a symbolic action, if the action is known.
    pub fn action(&self, action: &str) -> Option<String> {
        ACTION_PATHS
            .iter()
            .find(|(name, _)| *name == action)
            .map(|(_, path)| self.build(path))
    }

    /// Display page of a structured content item.
    pub fn content(&self, friendly_url: &str) -> String {
        self.build(&format!("/-/{}", friendly_url))
    }
}
