//! Reverse geocoding: coordinates to a city and country.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::PlaceName;

pub mod google;

pub use google::GoogleGeocoder;

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Resolve a coordinate pair. Fails when the provider returns no usable result;
    /// a result lacking a city or country resolves to [`PlaceName::unknown`].
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: &str,
    ) -> anyhow::Result<PlaceName>;
}
