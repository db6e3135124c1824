//! HTTP clients for the remote review sources

pub mod google_places;
pub mod hostaway;

pub use google_places::{GooglePlacesClient, PlaceCandidate, PlaceDetails, PlacesError};
pub use hostaway::{HostawayClient, HostawayError};
