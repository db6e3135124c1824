//! # revdash Common Library
//!
//! Shared code for the review dashboard service:
//! - Canonical review model and per-source profiles
//! - Rating scale adapter and review normalizer
//! - Aggregate statistics and the dashboard query engine
//! - Approval store adapters (dataset file, SQLite)
//! - Configuration loading and the fallback dataset reader
//!
//! The normalizer, aggregator and query engine are synchronous, pure
//! transformations over in-memory collections. Everything that touches the
//! filesystem or a database lives in `approval`, `config` and `dataset`.

pub mod aggregate;
pub mod approval;
pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod normalize;
pub mod query;
pub mod scale;
pub mod source;
pub mod time;

pub use aggregate::{aggregate, AggregateStats};
pub use error::{Error, Result};
pub use model::{CategoryRating, Review, ReviewId};
pub use normalize::Normalizer;
pub use query::{run_query, ReviewQuery, ReviewQueryParams};
pub use source::{ReviewSource, SourceProfile};
