//! HTTP API handlers for revdash-api

pub mod google;
pub mod health;
pub mod reviews;

pub use google::{find_google_place, get_google_reviews, google_routes};
pub use health::health_routes;
pub use reviews::{get_public_reviews, get_reviews, load_reviews, review_routes, update_approval};
