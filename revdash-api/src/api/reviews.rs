//! Review dashboard endpoints
//!
//! Every request re-reads the source, re-normalizes and overlays the stored
//! approval flags, so an approval is visible on the very next read.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use revdash_common::aggregate::AggregateStats;
use revdash_common::approval::{apply_approvals, ApprovalOutcome};
use revdash_common::dataset::{load_dataset, records};
use revdash_common::query::{facets, Facets};
use revdash_common::{
    aggregate, run_query, Normalizer, Review, ReviewId, ReviewQuery, ReviewQueryParams,
    ReviewSource,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Dashboard response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsResponse {
    pub status: &'static str,
    /// Filtered and sorted view
    pub data: Vec<Review>,
    /// Statistics over the whole collection, not just the view
    pub stats: AggregateStats,
    pub facets: Facets,
    /// Profile label of the source the reviews came from
    pub source: &'static str,
    pub timestamp: String,
}

/// Public (approved-only) response
#[derive(Debug, Serialize)]
pub struct PublicReviewsResponse {
    pub status: &'static str,
    pub data: Vec<Review>,
    pub total: usize,
    pub timestamp: String,
}

/// POST /api/reviews/hostaway request body
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub id: ReviewId,
    pub approved: bool,
}

/// POST /api/reviews/hostaway response
#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub status: &'static str,
    pub id: ReviewId,
    pub approved: bool,
    pub message: String,
}

/// Fetch, normalize and overlay approvals
///
/// Hostaway is tried first when a client is configured. Any failure or an
/// empty result falls back to the static dataset. Stored flags are only
/// overlaid when the approval store covers the source the reviews came from.
pub async fn load_reviews(state: &AppState) -> ApiResult<(Vec<Review>, ReviewSource)> {
    let (reviews, source) = match fetch_hostaway(state).await {
        Some(reviews) => (reviews, ReviewSource::Hostaway),
        None => (load_fallback(state).await?, ReviewSource::Fallback),
    };

    if !state.approvals.covers(source) {
        return Ok((reviews, source));
    }

    state.approvals.register(&reviews).await?;
    let stored = state.approvals.approvals().await?;

    Ok((apply_approvals(reviews, &stored), source))
}

async fn fetch_hostaway(state: &AppState) -> Option<Vec<Review>> {
    let client = state.hostaway.as_ref()?;

    match client.fetch_reviews().await {
        Ok(raw) if !raw.is_empty() => {
            info!(count = raw.len(), "Fetched reviews from Hostaway API");
            Some(Normalizer::new(ReviewSource::Hostaway).normalize_records(&raw))
        }
        Ok(_) => {
            warn!("Hostaway API returned no reviews, using fallback dataset");
            None
        }
        Err(e) => {
            warn!("Hostaway API unavailable ({}), using fallback dataset", e);
            None
        }
    }
}

async fn load_fallback(state: &AppState) -> ApiResult<Vec<Review>> {
    let path = &state.config.dataset.path;
    let document = load_dataset(path).await.map_err(|e| {
        error!("Failed to read review dataset {}: {}", path.display(), e);
        ApiError::Internal(format!("Failed to fetch reviews: {}", e))
    })?;

    Ok(Normalizer::new(ReviewSource::Fallback).normalize_records(records(&document)))
}

/// GET /api/reviews/hostaway
///
/// Query parameters: rating, channel, category, property, approval, sort,
/// sortBy, order. Unset or empty parameters apply no predicate.
pub async fn get_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewQueryParams>,
) -> ApiResult<Json<ReviewsResponse>> {
    let query = ReviewQuery::from_params(&params)?;
    let (reviews, source) = load_reviews(&state).await?;

    Ok(Json(ReviewsResponse {
        status: "success",
        data: run_query(&reviews, &query),
        stats: aggregate(&reviews),
        facets: facets(&reviews),
        source: source.profile().label,
        timestamp: revdash_common::time::now_iso(),
    }))
}

/// GET /api/reviews/public
pub async fn get_public_reviews(
    State(state): State<AppState>,
) -> ApiResult<Json<PublicReviewsResponse>> {
    let (reviews, _) = load_reviews(&state).await?;
    let data = run_query(&reviews, &ReviewQuery::public());

    Ok(Json(PublicReviewsResponse {
        status: "success",
        total: data.len(),
        data,
        timestamp: revdash_common::time::now_iso(),
    }))
}

/// POST /api/reviews/hostaway
pub async fn update_approval(
    State(state): State<AppState>,
    body: Result<Json<ApprovalRequest>, JsonRejection>,
) -> ApiResult<Json<ApprovalResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    match state
        .approvals
        .set_approved(&request.id, request.approved)
        .await?
    {
        ApprovalOutcome::Updated => {
            info!(id = %request.id, approved = request.approved, "Approval updated");
            let verb = if request.approved { "approved" } else { "unapproved" };
            Ok(Json(ApprovalResponse {
                status: "success",
                id: request.id,
                approved: request.approved,
                message: format!("Review {} successfully", verb),
            }))
        }
        ApprovalOutcome::NotFound => Err(ApiError::NotFound("Review not found".to_string())),
    }
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reviews/hostaway", get(get_reviews).post(update_approval))
        .route("/api/reviews/public", get(get_public_reviews))
}
