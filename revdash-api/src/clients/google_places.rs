//! Google Places API client
//!
//! Two calls: Find Place (text query to place id) and Place Details (name,
//! overall rating and the most relevant reviews). Reviews come back as raw
//! JSON objects for the normalizer's Google field mapping.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use revdash_common::config::GoogleConfig;

const DETAILS_FIELDS: &str = "name,rating,reviews,user_ratings_total";
const FIND_FIELDS: &str = "place_id,name,formatted_address";

/// Google Places client errors
#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("Google Places API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    /// Non-`OK` status in the response body
    #[error("Google API Error: {status}")]
    Status {
        status: String,
        message: Option<String>,
    },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Place Details result
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: String,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u64>,
    /// Raw review objects
    #[serde(default)]
    pub reviews: Vec<Value>,
}

/// Find Place candidate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaceCandidate {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    error_message: Option<String>,
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    candidates: Vec<PlaceCandidate>,
}

/// Google Places API client
pub struct GooglePlacesClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, PlacesError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(PlacesError::MissingApiKey)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlacesError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Look up a place's name, rating and reviews
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let url = format!("{}/details/json", self.base_url);
        tracing::debug!(place_id = %place_id, "Querying Place Details");

        let response: DetailsResponse = self
            .get_json(
                &url,
                &[
                    ("place_id", place_id),
                    ("fields", DETAILS_FIELDS),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        if response.status != "OK" {
            return Err(PlacesError::Status {
                status: response.status,
                message: response.error_message,
            });
        }

        Ok(response.result.unwrap_or_default())
    }

    /// Find the best-matching place for a name or address
    ///
    /// `Ok(None)` when Google has no candidate.
    pub async fn find_place(&self, query: &str) -> Result<Option<PlaceCandidate>, PlacesError> {
        let url = format!("{}/findplacefromtext/json", self.base_url);
        tracing::debug!(query = %query, "Querying Find Place");

        let response: FindPlaceResponse = self
            .get_json(
                &url,
                &[
                    ("input", query),
                    ("inputtype", "textquery"),
                    ("fields", FIND_FIELDS),
                    ("key", &self.api_key),
                ],
            )
            .await?;

        match response.status.as_str() {
            "OK" => Ok(response.candidates.into_iter().next()),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(PlacesError::Status {
                status: response.status,
                message: response.error_message,
            }),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlacesError> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| PlacesError::NetworkError(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| PlacesError::ParseError(e.to_string()))
    }
}
