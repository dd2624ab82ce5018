//! Host environment backed by the loaded configuration.

use crate::config::Config;
use askray_core::host::HostEnvironment;

/// Host capabilities for a standalone client: identity and portal access
/// come from configuration instead of the page the widget is embedded in.
#[derive(Debug, Clone)]
pub struct ConfiguredHost {
    signed_in: bool,
    user_email: String,
    origin: String,
    site_group_id: Option<String>,
    csrf_token: Option<String>,
}

impl ConfiguredHost {
    pub fn from_config(config: &Config) -> Self {
        Self {
            signed_in: config.signed_in,
            user_email: config.user_email.clone(),
            origin: config.portal_origin.trim_end_matches('/').to_string(),
            site_group_id: config.site_group_id.clone(),
            csrf_token: config.csrf_token.clone(),
        }
    }
}

impl HostEnvironment for ConfiguredHost {
    fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    fn user_identity(&self) -> &str {
        &self.user_email
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn site_group_id(&self) -> Option<&str> {
        self.site_group_id.as_deref()
    }

    fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}
