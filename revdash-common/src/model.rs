//! Canonical review model
//!
//! Every source is normalized into [`Review`]. Field names serialize in
//! camelCase so a serialized review is itself a valid raw record, which is
//! what makes re-normalization a no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Listing name used when a record does not say which property it is for
pub const UNKNOWN_LISTING: &str = "Unknown Listing";

/// Guest name used when a record is anonymous
pub const ANONYMOUS_GUEST: &str = "Anonymous";

/// Review classification used when a record carries none
pub const DEFAULT_REVIEW_TYPE: &str = "guest-to-host";

/// Lifecycle status used when a record carries none
pub const DEFAULT_STATUS: &str = "published";

/// Review identifier
///
/// Sources hand out either integer or string ids. Numeric ids sort before
/// textual ones; within a variant the natural ordering applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewId {
    Numeric(i64),
    Text(String),
}

impl ReviewId {
    /// Read an id out of a raw JSON value
    ///
    /// Returns `None` for null, empty strings and non-scalar values so the
    /// caller can fall back to the record's batch position.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Numeric(i)),
                None => Some(Self::Text(n.to_string())),
            },
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Id assigned to the record at `position` (zero-based) when the source gave none
    pub fn from_position(position: usize) -> Self {
        Self::Numeric(position as i64 + 1)
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ReviewId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for ReviewId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Sub-score for one quality dimension of a stay (0-10)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRating {
    pub category: String,
    /// Absent when the source listed the category without a score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl CategoryRating {
    pub fn new(category: impl Into<String>, rating: f64) -> Self {
        Self {
            category: category.into(),
            rating: Some(rating),
        }
    }
}

/// Canonical, source-agnostic review record
///
/// Only `approved` changes after ingestion, and only through an approval
/// store; the core never writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub listing_name: String,
    pub guest_name: String,
    /// Overall score on the 0-10 scale
    pub rating: f64,
    pub public_review: String,
    pub review_category: Vec<CategoryRating>,
    /// ISO 8601 timestamp as supplied by the source (or normalization time)
    pub submitted_at: String,
    pub channel: String,
    #[serde(rename = "type")]
    pub review_type: String,
    pub status: String,
    pub approved: bool,
}
