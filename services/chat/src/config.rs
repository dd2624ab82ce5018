use askray_core::transcript::DEFAULT_MAX_ENTRIES;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the NLU access token comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// A token supplied directly.
    Static(String),
    /// Exchanged through the portal backend for the given OAuth client.
    Backend {
        auth_endpoint: String,
        oauth2_client_erc: String,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub portal_origin: String,
    pub site_url: String,
    pub site_group_id: Option<String>,
    pub asset_library_id: Option<String>,
    pub dialogflow_project_id: String,
    pub dialogflow_base_url: String,
    pub token_source: TokenSource,
    pub transcript_endpoint: String,
    pub intent_fulfilment_endpoint: Option<String>,
    pub max_entries: u32,
    pub user_email: String,
    pub csrf_token: Option<String>,
    pub signed_in: bool,
    pub log_level: Level,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let portal_origin = required("PORTAL_ORIGIN")?;
        let dialogflow_project_id = required("DIALOGFLOW_PROJECT_ID")?;
        let transcript_endpoint = required("TRANSCRIPT_ENDPOINT")?;
        let user_email = required("USER_EMAIL_ADDRESS")?;

        let token_source = match (
            optional("DIALOGFLOW_ACCESS_TOKEN"),
            optional("OAUTH2_CLIENT_ERC"),
            optional("AUTH_ENDPOINT"),
        ) {
            (Some(token), _, _) => TokenSource::Static(token),
            (None, Some(oauth2_client_erc), Some(auth_endpoint)) => TokenSource::Backend {
                auth_endpoint,
                oauth2_client_erc,
            },
            _ => {
                return Err(ConfigError::MissingVar(
                    "DIALOGFLOW_ACCESS_TOKEN, or OAUTH2_CLIENT_ERC with AUTH_ENDPOINT".to_string(),
                ));
            }
        };

        let site_group_id = optional("SITE_GROUP_ID");
        let asset_library_id = optional("ASSET_LIBRARY_ID");
        if site_group_id.is_none() && asset_library_id.is_none() {
            return Err(ConfigError::MissingVar(
                "SITE_GROUP_ID must be set when ASSET_LIBRARY_ID is not".to_string(),
            ));
        }

        let max_entries = match optional("MAX_ENTRIES") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "MAX_ENTRIES".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ));
                }
            },
            None => DEFAULT_MAX_ENTRIES,
        };

        let signed_in = match optional("SIGNED_IN").map(|v| v.to_lowercase()) {
            None => true,
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" => false,
            Some(v) => {
                return Err(ConfigError::InvalidValue(
                    "SIGNED_IN".to_string(),
                    format!("'{}' is not a boolean", v),
                ));
            }
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            portal_origin,
            site_url: optional("SITE_URL").unwrap_or_default(),
            site_group_id,
            asset_library_id,
            dialogflow_project_id,
            dialogflow_base_url: optional("DIALOGFLOW_BASE_URL")
                .unwrap_or_else(|| askray_core::nlu::DEFAULT_BASE_URL.to_string()),
            token_source,
            transcript_endpoint,
            intent_fulfilment_endpoint: optional("INTENT_FULFILMENT_ENDPOINT"),
            max_entries,
            user_email,
            csrf_token: optional("CSRF_TOKEN"),
            signed_in,
            log_level,
        })
    }
}
