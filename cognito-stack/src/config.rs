//! Stack configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use shared::config::{require_var, split_list, split_verbatim};
use shared::{Error, Result};

pub const DEFAULT_STACK_NAME: &str = "CognitoTestStack";

/// Inputs of the stack definition, fixed for one synthesis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    #[serde(default = "default_stack_name")]
    pub stack_name: String,
    /// Display name of the user pool
    pub user_pool_name: String,
    /// Hosted UI prefix, `{prefix}.auth.{region}.amazoncognito.com`
    pub domain_prefix: String,
    /// Secret holding `{"client_id": ..., "client_secret": ...}`
    pub google_oauth_client_secret_name: String,
    /// Display name of the app client
    pub client_name: String,
    /// Redirect URLs; the first one goes into the authorization URL output
    pub callback_urls: Vec<String>,
    /// Addresses the pre sign-up gate lets through
    pub sign_up_allow_emails: Vec<String>,
}

fn default_stack_name() -> String {
    DEFAULT_STACK_NAME.to_string()
}

impl StackConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("Invalid stack config: {}", e)))
    }

    /// Load configuration from environment variables. List values are comma-separated;
    /// callback URLs are trimmed, allow-list entries are kept verbatim.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            stack_name: std::env::var("STACK_NAME").unwrap_or_else(|_| default_stack_name()),
            user_pool_name: require_var("USER_POOL_NAME")?,
            domain_prefix: require_var("DOMAIN_PREFIX")?,
            google_oauth_client_secret_name: require_var("GOOGLE_OAUTH_CLIENT_SECRET_NAME")?,
            client_name: require_var("CLIENT_NAME")?,
            callback_urls: split_list(&require_var("CALLBACK_URLS")?),
            sign_up_allow_emails: split_verbatim(&require_var("SIGN_UP_ALLOW_EMAILS")?),
        })
    }

    /// Load from `path` when given, otherwise from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::from_env(),
        }
    }
}
