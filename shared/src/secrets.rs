//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Google OAuth client credentials as stored in Secrets Manager.
///
/// The secret is the `web` section of Google's `client_secret.json`, flattened
/// to the two keys Cognito needs.
#[derive(Deserialize)]
pub struct GoogleOAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for GoogleOAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleOAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl GoogleOAuthCredentials {
    /// Parse credentials from a secret string.
    pub fn from_secret_string(secret_string: &str) -> Result<Self> {
        let credentials: Self = serde_json::from_str(secret_string)
            .map_err(|e| Error::Aws(format!("Failed to parse Google OAuth credentials: {}", e)))?;

        if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
            return Err(Error::Aws(
                "Google OAuth credentials have an empty client_id or client_secret".to_string(),
            ));
        }

        Ok(credentials)
    }
}

/// Build a Secrets Manager client from the default AWS configuration chain.
pub async fn secrets_client() -> SecretsClient {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    SecretsClient::new(&config)
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_id: &str) -> Result<String> {
    if let Some(value) = get_cache().read().await.get(secret_id) {
        return Ok(value.clone());
    }

    tracing::debug!(secret_id, "fetching secret");

    let response = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret {}: {}", secret_id, e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    get_cache()
        .write()
        .await
        .insert(secret_id.to_string(), secret_string.clone());

    Ok(secret_string)
}

/// Get the Google OAuth client credentials from Secrets Manager.
pub async fn get_google_oauth_credentials(
    client: &SecretsClient,
    secret_id: &str,
) -> Result<GoogleOAuthCredentials> {
    let secret_string = get_secret(client, secret_id).await?;
    GoogleOAuthCredentials::from_secret_string(&secret_string)
}

/// Drop cached secrets so the next lookup sees a rotated Google client secret.
pub async fn clear_cache() {
    get_cache().write().await.clear();
}
