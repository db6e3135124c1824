//! Dashboard query engine
//!
//! Filters a review collection with ANDed optional predicates and sorts the
//! survivors stably. Callers supply stringly-typed parameters at the HTTP
//! boundary; [`ReviewQuery::from_params`] turns them into typed predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

use crate::model::{Review, ReviewId};
use crate::time::parse_timestamp;
use crate::{Error, Result};

/// Approval state predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalFilter {
    Approved,
    Pending,
}

impl FromStr for ApprovalFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(Self::Approved),
            "pending" | "unapproved" | "not-approved" => Ok(Self::Pending),
            other => Err(Error::InvalidInput(format!("unknown approval state: {}", other))),
        }
    }
}

/// Filter predicates; `None` matches everything for that dimension
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    /// Inclusive lower bound on `rating`
    pub min_rating: Option<f64>,
    pub channel: Option<String>,
    /// Matches when any category entry carries this name, whatever its score
    pub category: Option<String>,
    /// Exact listing name
    pub property: Option<String>,
    pub approval: Option<ApprovalFilter>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        let rating_match = self.min_rating.map_or(true, |min| review.rating >= min);
        let channel_match = self.channel.as_ref().map_or(true, |c| &review.channel == c);
        let category_match = self.category.as_ref().map_or(true, |wanted| {
            review.review_category.iter().any(|c| &c.category == wanted)
        });
        let property_match = self
            .property
            .as_ref()
            .map_or(true, |p| &review.listing_name == p);
        let approval_match = self.approval.map_or(true, |a| match a {
            ApprovalFilter::Approved => review.approved,
            ApprovalFilter::Pending => !review.approved,
        });

        rating_match && channel_match && category_match && property_match && approval_match
    }
}

/// Review field to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    ListingName,
    GuestName,
    Rating,
    PublicReview,
    SubmittedAt,
    Channel,
    Type,
    Status,
    Approved,
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "id" => Ok(Self::Id),
            "listingName" => Ok(Self::ListingName),
            "guestName" => Ok(Self::GuestName),
            "rating" => Ok(Self::Rating),
            "publicReview" => Ok(Self::PublicReview),
            "submittedAt" => Ok(Self::SubmittedAt),
            "channel" => Ok(Self::Channel),
            "type" => Ok(Self::Type),
            "status" => Ok(Self::Status),
            "approved" => Ok(Self::Approved),
            other => Err(Error::InvalidInput(format!("cannot sort by: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(Error::InvalidInput(format!("unknown sort order: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    /// Newest first, the dashboard's opening view
    fn default() -> Self {
        Self {
            field: SortField::SubmittedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Stringly-typed query parameters as received from callers
///
/// Empty strings mean "not set", matching how the dashboard's select
/// boxes report their "All ..." choices.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueryParams {
    pub rating: Option<String>,
    pub channel: Option<String>,
    pub category: Option<String>,
    pub property: Option<String>,
    pub approval: Option<String>,
    /// Combined `field-direction` form, e.g. `submittedAt-desc`
    pub sort: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Typed filter + sort
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQuery {
    pub filter: ReviewFilter,
    pub sort: SortOrder,
}

impl ReviewQuery {
    /// Parse boundary parameters into typed predicates
    pub fn from_params(params: &ReviewQueryParams) -> Result<Self> {
        let min_rating = match set(&params.rating) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|r| r.is_finite())
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("rating must be a number, got: {}", raw))
                    })?,
            ),
            None => None,
        };

        let filter = ReviewFilter {
            min_rating,
            channel: set(&params.channel).map(str::to_string),
            category: set(&params.category).map(str::to_string),
            property: set(&params.property).map(str::to_string),
            approval: set(&params.approval)
                .map(str::parse::<ApprovalFilter>)
                .transpose()?,
        };

        let mut sort = SortOrder::default();
        if let Some(combined) = set(&params.sort) {
            let (field, direction) = combined.rsplit_once('-').ok_or_else(|| {
                Error::InvalidInput(format!("sort must look like field-direction, got: {}", combined))
            })?;
            sort.field = field.parse()?;
            sort.direction = direction.parse()?;
        }
        if let Some(field) = set(&params.sort_by) {
            sort.field = field.parse()?;
        }
        if let Some(direction) = set(&params.order) {
            sort.direction = direction.parse()?;
        }

        Ok(Self { filter, sort })
    }

    /// Approved reviews only, newest first
    pub fn public() -> Self {
        Self {
            filter: ReviewFilter {
                approval: Some(ApprovalFilter::Approved),
                ..Default::default()
            },
            sort: SortOrder::default(),
        }
    }
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Filter and sort `reviews` into a new collection
///
/// The input is left untouched. Ties keep their input order.
pub fn run_query(reviews: &[Review], query: &ReviewQuery) -> Vec<Review> {
    let mut keyed: Vec<(SortKey<'_>, &Review)> = reviews
        .iter()
        .filter(|r| query.filter.matches(r))
        .map(|r| (SortKey::of(r, query.sort.field), r))
        .collect();

    // slice::sort_by is stable; reversing an Equal stays Equal
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = a.compare(b);
        match query.sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

/// Pre-extracted sort key so timestamps are parsed once per review
enum SortKey<'a> {
    Id(&'a ReviewId),
    Text(&'a str),
    Number(f64),
    /// Unparseable timestamps sort before every parseable one
    Time(Option<DateTime<Utc>>),
    Flag(bool),
}

impl<'a> SortKey<'a> {
    fn of(review: &'a Review, field: SortField) -> Self {
        match field {
            SortField::Id => Self::Id(&review.id),
            SortField::ListingName => Self::Text(&review.listing_name),
            SortField::GuestName => Self::Text(&review.guest_name),
            SortField::Rating => Self::Number(review.rating),
            SortField::PublicReview => Self::Text(&review.public_review),
            SortField::SubmittedAt => Self::Time(parse_timestamp(&review.submitted_at)),
            SortField::Channel => Self::Text(&review.channel),
            SortField::Type => Self::Text(&review.review_type),
            SortField::Status => Self::Text(&review.status),
            SortField::Approved => Self::Flag(review.approved),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Id(a), Self::Id(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Flag(a), Self::Flag(b)) => a.cmp(b),
            // Keys within one query always share a variant
            _ => Ordering::Equal,
        }
    }
}

/// Distinct values available to filter on, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub channels: Vec<String>,
    pub categories: Vec<String>,
    pub properties: Vec<String>,
}

pub fn facets(reviews: &[Review]) -> Facets {
    Facets {
        channels: distinct(reviews.iter().map(|r| r.channel.as_str())),
        categories: distinct(
            reviews
                .iter()
                .flat_map(|r| r.review_category.iter().map(|c| c.category.as_str())),
        ),
        properties: distinct(reviews.iter().map(|r| r.listing_name.as_str())),
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
