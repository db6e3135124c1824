//! Aggregate statistics over canonical reviews
//!
//! Pure: recomputed on every call, never persisted. An empty collection has
//! a defined zero value for every statistic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::model::{Review, ReviewId};

/// Category scores at or below this count as a recurring issue
pub const LOW_SCORE_THRESHOLD: f64 = 6.0;

/// Summary statistics for a review collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: usize,
    /// Mean rating, two decimals; `0` when empty
    pub average_rating: f64,
    /// Reviews currently cleared for public display
    pub approved: usize,
    /// One rollup per listing, in first-seen order
    pub by_property: Vec<PropertyRollup>,
    pub by_channel: BTreeMap<String, usize>,
    pub rating_distribution: RatingDistribution,
    /// Low category scores per category; categories without any are absent
    pub recurring_issues: BTreeMap<String, usize>,
}

/// Per-listing rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRollup {
    pub name: String,
    pub count: usize,
    /// Ids of the reviews in this group, in input order
    #[serde(rename = "reviews")]
    pub review_ids: Vec<ReviewId>,
    pub average_rating: f64,
    pub approved_count: usize,
}

/// Rating bucket a review falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingBucket {
    Ten,
    Nine,
    Eight,
    Seven,
    Six,
    Five,
    BelowFive,
}

impl RatingBucket {
    /// Highest bucket whose lower bound `rating` meets
    pub fn for_rating(rating: f64) -> Self {
        if rating >= 10.0 {
            Self::Ten
        } else if rating >= 9.0 {
            Self::Nine
        } else if rating >= 8.0 {
            Self::Eight
        } else if rating >= 7.0 {
            Self::Seven
        } else if rating >= 6.0 {
            Self::Six
        } else if rating >= 5.0 {
            Self::Five
        } else {
            Self::BelowFive
        }
    }
}

/// Review counts per rating bucket
///
/// All seven buckets are always present, zero-count ones included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    #[serde(rename = "10")]
    pub ten: usize,
    #[serde(rename = "9")]
    pub nine: usize,
    #[serde(rename = "8")]
    pub eight: usize,
    #[serde(rename = "7")]
    pub seven: usize,
    #[serde(rename = "6")]
    pub six: usize,
    #[serde(rename = "5")]
    pub five: usize,
    #[serde(rename = "below5")]
    pub below_five: usize,
}

impl RatingDistribution {
    pub fn record(&mut self, rating: f64) {
        *self.slot(RatingBucket::for_rating(rating)) += 1;
    }

    pub fn count(&self, bucket: RatingBucket) -> usize {
        match bucket {
            RatingBucket::Ten => self.ten,
            RatingBucket::Nine => self.nine,
            RatingBucket::Eight => self.eight,
            RatingBucket::Seven => self.seven,
            RatingBucket::Six => self.six,
            RatingBucket::Five => self.five,
            RatingBucket::BelowFive => self.below_five,
        }
    }

    fn slot(&mut self, bucket: RatingBucket) -> &mut usize {
        match bucket {
            RatingBucket::Ten => &mut self.ten,
            RatingBucket::Nine => &mut self.nine,
            RatingBucket::Eight => &mut self.eight,
            RatingBucket::Seven => &mut self.seven,
            RatingBucket::Six => &mut self.six,
            RatingBucket::Five => &mut self.five,
            RatingBucket::BelowFive => &mut self.below_five,
        }
    }
}

/// Compute summary statistics for `reviews`
pub fn aggregate(reviews: &[Review]) -> AggregateStats {
    let mut by_channel = BTreeMap::new();
    let mut rating_distribution = RatingDistribution::default();

    for review in reviews {
        *by_channel.entry(review.channel.clone()).or_insert(0) += 1;
        rating_distribution.record(review.rating);
    }

    AggregateStats {
        total: reviews.len(),
        average_rating: average(reviews.iter().map(|r| r.rating).sum(), reviews.len()),
        approved: reviews.iter().filter(|r| r.approved).count(),
        by_property: group_by_property(reviews),
        by_channel,
        rating_distribution,
        recurring_issues: recurring_issues(reviews),
    }
}

/// Group reviews by listing name, preserving first-seen order
pub fn group_by_property(reviews: &[Review]) -> Vec<PropertyRollup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(PropertyRollup, f64)> = Vec::new();

    for review in reviews {
        let slot = *index.entry(review.listing_name.as_str()).or_insert_with(|| {
            groups.push((
                PropertyRollup {
                    name: review.listing_name.clone(),
                    count: 0,
                    review_ids: Vec::new(),
                    average_rating: 0.0,
                    approved_count: 0,
                },
                0.0,
            ));
            groups.len() - 1
        });

        let (rollup, rating_sum) = &mut groups[slot];
        rollup.count += 1;
        rollup.review_ids.push(review.id.clone());
        if review.approved {
            rollup.approved_count += 1;
        }
        *rating_sum += review.rating;
    }

    groups
        .into_iter()
        .map(|(mut rollup, rating_sum)| {
            rollup.average_rating = average(rating_sum, rollup.count);
            rollup
        })
        .collect()
}

/// Count category scores at or below [`LOW_SCORE_THRESHOLD`]
pub fn recurring_issues(reviews: &[Review]) -> BTreeMap<String, usize> {
    let mut issues = BTreeMap::new();

    for category in reviews.iter().flat_map(|r| &r.review_category) {
        if matches!(category.rating, Some(rating) if rating <= LOW_SCORE_THRESHOLD) {
            *issues.entry(category.category.clone()).or_insert(0) += 1;
        }
    }

    issues
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round_to_cents(sum / count as f64)
}

/// Round to two decimal places
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
