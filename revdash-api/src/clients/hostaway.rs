//! Hostaway reviews API client
//!
//! Returns raw review records; normalization happens in the caller.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use revdash_common::config::HostawayConfig;
use revdash_common::dataset::records;

const USER_AGENT: &str = concat!("revdash/", env!("CARGO_PKG_VERSION"));

/// Hostaway client errors
#[derive(Debug, Error)]
pub enum HostawayError {
    #[error("Hostaway API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}")]
    ApiError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Hostaway API client
pub struct HostawayClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    account_id: Option<String>,
}

impl HostawayClient {
    pub fn new(config: &HostawayConfig) -> Result<Self, HostawayError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(HostawayError::MissingApiKey)?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HostawayError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            account_id: config.account_id.clone(),
        })
    }

    /// Fetch all reviews visible to the configured account
    pub async fn fetch_reviews(&self) -> Result<Vec<Value>, HostawayError> {
        let url = format!("{}/reviews", self.base_url);

        tracing::debug!(url = %url, account_id = ?self.account_id, "Querying Hostaway API");

        let mut request = self.http_client.get(&url).bearer_auth(&self.api_key);
        if let Some(account_id) = &self.account_id {
            request = request.header("X-Hostaway-Account", account_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HostawayError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostawayError::ApiError(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| HostawayError::ParseError(e.to_string()))?;

        Ok(records(&body).to_vec())
    }
}
