//! Review normalizer
//!
//! Maps raw records from any source onto the canonical [`Review`]. Never
//! fails: missing or wrongly-typed fields are replaced by defaults, unknown
//! fields are ignored. Defaults only ever fill gaps, so feeding a canonical
//! review back through a 10-scale source returns it unchanged.

use serde_json::Value;

use crate::model::{
    CategoryRating, Review, ReviewId, ANONYMOUS_GUEST, DEFAULT_REVIEW_TYPE, DEFAULT_STATUS,
    UNKNOWN_LISTING,
};
use crate::scale::to_canonical_scale;
use crate::source::{IdField, ReviewSource, SourceProfile, TimestampField};
use crate::time::{epoch_seconds_to_iso, now_iso};

/// Normalizes records from one source batch
///
/// The normalization timestamp is captured once, so every record in a batch
/// that lacks `submittedAt` receives the same value.
#[derive(Debug, Clone)]
pub struct Normalizer {
    profile: SourceProfile,
    listing_name: Option<String>,
    normalized_at: String,
}

impl Normalizer {
    /// Create a normalizer for `source`, stamped with the current time
    pub fn new(source: ReviewSource) -> Self {
        Self {
            profile: source.profile(),
            listing_name: None,
            normalized_at: now_iso(),
        }
    }

    /// Listing name for records that do not carry one
    ///
    /// Place Details responses name the property once for the whole batch.
    pub fn with_listing_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.listing_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Override the timestamp used for records without `submittedAt`
    pub fn with_timestamp(mut self, normalized_at: impl Into<String>) -> Self {
        self.normalized_at = normalized_at.into();
        self
    }

    /// Normalize every record in a raw batch
    ///
    /// Anything other than a JSON array is an empty batch.
    pub fn normalize_batch(&self, raw: &Value) -> Vec<Review> {
        match raw.as_array() {
            Some(records) => self.normalize_records(records),
            None => Vec::new(),
        }
    }

    pub fn normalize_records(&self, records: &[Value]) -> Vec<Review> {
        records
            .iter()
            .enumerate()
            .map(|(position, raw)| self.normalize(raw, position))
            .collect()
    }

    /// Normalize one raw record found at `position` (zero-based) in its batch
    ///
    /// **Algorithm:**
    /// 1. id = raw id, else `position + 1`
    /// 2. rating = rescaled raw rating (a real `0` counts), else the rounded
    ///    mean of the category ratings, else `0`
    /// 3. everything else = raw value when present and non-empty, else default
    pub fn normalize(&self, raw: &Value, position: usize) -> Review {
        let fields = &self.profile.fields;

        let id = self
            .read_id(raw, fields.id)
            .unwrap_or_else(|| ReviewId::from_position(position));

        let review_category = self.read_categories(raw.get(fields.review_category));

        let rating = to_canonical_scale(number(raw, fields.rating), self.profile.scale_max)
            .unwrap_or_else(|| derived_rating(&review_category));

        let listing_name = text(raw, fields.listing_name)
            .or_else(|| self.listing_name.clone())
            .unwrap_or_else(|| UNKNOWN_LISTING.to_string());

        let submitted_at = self
            .read_timestamp(raw, fields.submitted_at)
            .unwrap_or_else(|| self.normalized_at.clone());

        Review {
            id,
            listing_name,
            guest_name: text(raw, fields.guest_name).unwrap_or_else(|| ANONYMOUS_GUEST.to_string()),
            rating,
            public_review: text(raw, fields.public_review).unwrap_or_default(),
            review_category,
            submitted_at,
            channel: text(raw, fields.channel)
                .unwrap_or_else(|| self.profile.default_channel.to_string()),
            review_type: text(raw, fields.review_type)
                .unwrap_or_else(|| DEFAULT_REVIEW_TYPE.to_string()),
            status: text(raw, fields.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            approved: raw
                .get(fields.approved)
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    fn read_id(&self, raw: &Value, field: IdField) -> Option<ReviewId> {
        match field {
            IdField::Field(name) => raw.get(name).and_then(ReviewId::from_json),
            IdField::Prefixed { prefix, field } => raw
                .get(field)
                .and_then(ReviewId::from_json)
                .map(|id| ReviewId::Text(format!("{}{}", prefix, id))),
        }
    }

    fn read_timestamp(&self, raw: &Value, field: TimestampField) -> Option<String> {
        match field {
            TimestampField::Iso(name) => text(raw, name),
            TimestampField::EpochSeconds(name) => raw
                .get(name)
                .and_then(Value::as_i64)
                .and_then(epoch_seconds_to_iso),
        }
    }

    fn read_categories(&self, raw: Option<&Value>) -> Vec<CategoryRating> {
        let Some(entries) = raw.and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|entry| entry.is_object())
            .map(|entry| CategoryRating {
                category: text(entry, "category").unwrap_or_default(),
                rating: to_canonical_scale(number(entry, "rating"), self.profile.scale_max),
            })
            .collect()
    }
}

/// Rounded mean of category ratings; unscored categories count as 0
fn derived_rating(categories: &[CategoryRating]) -> f64 {
    if categories.is_empty() {
        return 0.0;
    }

    let sum: f64 = categories.iter().map(|c| c.rating.unwrap_or(0.0)).sum();
    (sum / categories.len() as f64).round()
}

fn text(raw: &Value, field: &str) -> Option<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(raw: &Value, field: &str) -> Option<f64> {
    raw.get(field).and_then(Value::as_f64)
}
