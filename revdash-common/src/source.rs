//! Review sources and their declared capabilities
//!
//! Each source names its native rating scale, the channel label to use when
//! a record carries none, and where the canonical fields live in its raw
//! records. The normalizer reads these instead of sniffing record shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record's id comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    /// Id is stored verbatim in this field
    Field(&'static str),
    /// Id is `prefix` followed by the value of `field`
    Prefixed {
        prefix: &'static str,
        field: &'static str,
    },
}

/// Where a record's submission time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    /// String timestamp, kept as supplied
    Iso(&'static str),
    /// Unix epoch seconds, converted to RFC 3339
    EpochSeconds(&'static str),
}

/// Raw field names for each canonical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub id: IdField,
    pub listing_name: &'static str,
    pub guest_name: &'static str,
    pub rating: &'static str,
    pub public_review: &'static str,
    pub review_category: &'static str,
    pub submitted_at: TimestampField,
    pub channel: &'static str,
    pub review_type: &'static str,
    pub status: &'static str,
    pub approved: &'static str,
}

impl FieldMap {
    /// Records that already use the canonical field names
    pub const CANONICAL: FieldMap = FieldMap {
        id: IdField::Field("id"),
        listing_name: "listingName",
        guest_name: "guestName",
        rating: "rating",
        public_review: "publicReview",
        review_category: "reviewCategory",
        submitted_at: TimestampField::Iso("submittedAt"),
        channel: "channel",
        review_type: "type",
        status: "status",
        approved: "approved",
    };

    /// Place Details review objects
    pub const GOOGLE_PLACES: FieldMap = FieldMap {
        id: IdField::Prefixed {
            prefix: "google-",
            field: "time",
        },
        listing_name: "listingName",
        guest_name: "author_name",
        rating: "rating",
        public_review: "text",
        review_category: "reviewCategory",
        submitted_at: TimestampField::EpochSeconds("time"),
        channel: "channel",
        review_type: "type",
        status: "status",
        approved: "approved",
    };
}

/// Capabilities a review source declares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceProfile {
    /// Label reported to callers as the data's origin
    pub label: &'static str,
    /// Highest rating the source hands out
    pub scale_max: f64,
    /// Channel assigned to records that do not name one
    pub default_channel: &'static str,
    pub fields: FieldMap,
}

/// The review sources the dashboard knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSource {
    /// Property-management API
    Hostaway,
    /// Static dataset served when the API is unavailable
    Fallback,
    /// Maps/places API
    Google,
}

impl ReviewSource {
    pub fn profile(self) -> SourceProfile {
        match self {
            Self::Hostaway => SourceProfile {
                label: "hostaway-api",
                scale_max: 10.0,
                default_channel: "Hostaway",
                fields: FieldMap::CANONICAL,
            },
            Self::Fallback => SourceProfile {
                label: "mock-data",
                scale_max: 10.0,
                default_channel: "Hostaway",
                fields: FieldMap::CANONICAL,
            },
            Self::Google => SourceProfile {
                label: "google",
                scale_max: 5.0,
                default_channel: "Google Reviews",
                fields: FieldMap::GOOGLE_PLACES,
            },
        }
    }
}

impl fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.profile().label)
    }
}
