//! Approval store adapters
//!
//! The `approved` flag belongs to the store, not to the core. Reviews read
//! the latest stored value at query time through [`apply_approvals`]; racing
//! writes on one id resolve last-write-wins inside the store.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Review, ReviewId};
use crate::source::ReviewSource;
use crate::Result;

mod json_file;
#[cfg(feature = "sqlx")]
mod sqlite;

pub use json_file::JsonFileApprovalStore;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteApprovalStore;

/// Result of an approval update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Updated,
    NotFound,
}

/// Durable home of each review's `approved` flag
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Short name for logs
    fn backend(&self) -> &'static str;

    /// Whether stored flags apply to reviews ingested from `source`
    ///
    /// Reviews from an uncovered source keep their normalized flag.
    fn covers(&self, _source: ReviewSource) -> bool {
        true
    }

    /// Set the flag for `id`
    async fn set_approved(&self, id: &ReviewId, approved: bool) -> Result<ApprovalOutcome>;

    /// Every stored flag, keyed by review id
    async fn approvals(&self) -> Result<HashMap<ReviewId, bool>>;

    /// Make freshly ingested reviews known to the store
    ///
    /// Ids already stored keep their flag. Stores that derive their id set
    /// from elsewhere ignore this.
    async fn register(&self, _reviews: &[Review]) -> Result<()> {
        Ok(())
    }
}

/// Overlay stored approval flags onto normalized reviews
///
/// Reviews the store has no entry for keep their normalized flag.
pub fn apply_approvals(reviews: Vec<Review>, approvals: &HashMap<ReviewId, bool>) -> Vec<Review> {
    reviews
        .into_iter()
        .map(|mut review| {
            if let Some(&approved) = approvals.get(&review.id) {
                review.approved = approved;
            }
            review
        })
        .collect()
}
