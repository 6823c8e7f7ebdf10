use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{error::WeatherscopeError, model::PlaceName};

use super::Geocoder;

const GEOCODE_PATH: &str = "/maps/api/geocode/json";
const STATUS_OK: &str = "OK";
const CITY_TYPE: &str = "locality";
const COUNTRY_TYPE: &str = "country";

/// Google Maps Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    base_url: String,
    http: Client,
}

impl GoogleGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GeocodeResult {
    fn component(&self, kind: &str) -> Option<String> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.clone())
    }

    fn place_name(&self) -> PlaceName {
        PlaceName::from_parts(self.component(CITY_TYPE), self.component(COUNTRY_TYPE))
    }
}

impl GeocodeResponse {
    fn into_place_name(self) -> Result<PlaceName, WeatherscopeError> {
        match self.results.first() {
            Some(first) if self.status == STATUS_OK => Ok(first.place_name()),
            _ => Err(WeatherscopeError::Unresolved {
                status: self.status,
                results: self.results.len(),
            }),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        api_key: &str,
    ) -> Result<PlaceName> {
        let url = format!("{}{}", self.base_url, GEOCODE_PATH);
        let latlng = format!("{latitude},{longitude}");
        debug!(url = %url, latlng = %latlng, "requesting reverse geocode");

        let res = self
            .http
            .get(&url)
            .query(&[("latlng", latlng.as_str()), ("key", api_key)])
            .send()
            .await
            .context("Failed to send request to Google Geocoding")?;

        let body = res
            .text()
            .await
            .context("Failed to read Google Geocoding response body")?;

        let parsed: GeocodeResponse =
            serde_json::from_str(&body).context("Failed to parse Google Geocoding JSON")?;

        let place = parsed.into_place_name()?;
        info!(%place, "reverse geocoded");
        Ok(place)
    }
}
