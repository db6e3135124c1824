//! Google Places review endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use revdash_common::{Normalizer, Review, ReviewSource};

use crate::clients::{GooglePlacesClient, PlacesError};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReviewsParams {
    pub place_id: Option<String>,
}

/// Place summary reported alongside the reviews
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceMetadata {
    pub total_reviews: u64,
    /// Google's own overall rating (1-5)
    pub average_rating: Option<f64>,
    pub place_name: String,
}

#[derive(Debug, Serialize)]
pub struct GoogleReviewsResponse {
    pub success: bool,
    pub source: &'static str,
    pub data: Vec<Review>,
    pub metadata: PlaceMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPlaceRequest {
    pub property_name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindPlaceResponse {
    pub success: bool,
    pub place_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
}

fn client(state: &AppState) -> ApiResult<&Arc<GooglePlacesClient>> {
    state
        .google
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("Google Places API key not configured".to_string()))
}

fn places_error(context: &str, e: PlacesError) -> ApiError {
    match e {
        PlacesError::Status { .. } => ApiError::BadRequest(e.to_string()),
        other => {
            error!("{}: {}", context, other);
            ApiError::Internal(format!("{}: {}", context, other))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /api/reviews/google?placeId=...
pub async fn get_google_reviews(
    State(state): State<AppState>,
    Query(params): Query<GoogleReviewsParams>,
) -> ApiResult<Json<GoogleReviewsResponse>> {
    let client = client(&state)?;
    let place_id = non_empty(params.place_id)
        .ok_or_else(|| ApiError::BadRequest("placeId parameter is required".to_string()))?;

    let details = client
        .place_details(&place_id)
        .await
        .map_err(|e| places_error("Failed to fetch Google reviews", e))?;

    let data = Normalizer::new(ReviewSource::Google)
        .with_listing_name(details.name.clone())
        .normalize_records(&details.reviews);

    info!(place_id = %place_id, count = data.len(), "Fetched Google reviews");

    Ok(Json(GoogleReviewsResponse {
        success: true,
        source: ReviewSource::Google.profile().label,
        metadata: PlaceMetadata {
            total_reviews: details
                .user_ratings_total
                .unwrap_or(details.reviews.len() as u64),
            average_rating: details.rating,
            place_name: details.name,
        },
        data,
    }))
}

/// POST /api/reviews/google
///
/// Resolves a property name (preferred) or address to a Google place id.
pub async fn find_google_place(
    State(state): State<AppState>,
    body: Result<Json<FindPlaceRequest>, JsonRejection>,
) -> ApiResult<Json<FindPlaceResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = non_empty(request.property_name)
        .or_else(|| non_empty(request.address))
        .ok_or_else(|| ApiError::BadRequest("propertyName or address is required".to_string()))?;

    let client = client(&state)?;
    let candidate = client
        .find_place(&query)
        .await
        .map_err(|e| places_error("Failed to search for property", e))?
        .ok_or_else(|| ApiError::NotFound("Property not found on Google".to_string()))?;

    Ok(Json(FindPlaceResponse {
        success: true,
        place_id: candidate.place_id,
        name: candidate.name,
        address: candidate.formatted_address,
    }))
}

/// Build Google routes
pub fn google_routes() -> Router<AppState> {
    Router::new().route(
        "/api/reviews/google",
        get(get_google_reviews).post(find_google_place),
    )
}
