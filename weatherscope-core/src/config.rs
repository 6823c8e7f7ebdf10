use std::env;

use crate::error::WeatherscopeError;

pub const WEATHER_SECRET_VAR: &str = "OpenWeatherApiKeySecretName";
pub const GEOCODING_SECRET_VAR: &str = "GoogleMapsApiKeySecretName";
pub const CACHE_TABLE_VAR: &str = "CFDynamoDBWeatherTableName";
pub const TOPIC_ARN_VAR: &str = "CFWeatherSnsTopicArn";
pub const OPENWEATHER_URL_VAR: &str = "WEATHERSCOPE_OPENWEATHER_URL";
pub const GEOCODING_URL_VAR: &str = "WEATHERSCOPE_GEOCODING_URL";

pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_GEOCODING_URL: &str = "https://maps.googleapis.com";

/// Deployment configuration, read from the function environment.
///
/// Required identifiers are not checked when loading; a missing one surfaces
/// as [`WeatherscopeError::MissingConfig`] the first time it is needed.
#[derive(Debug, Clone)]
pub struct Config {
    pub weather_secret_id: Option<String>,
    pub geocoding_secret_id: Option<String>,
    pub cache_table: Option<String>,
    pub topic_arn: Option<String>,
    pub openweather_url: String,
    pub geocoding_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_secret_id: None,
            geocoding_secret_id: None,
            cache_table: None,
            topic_arn: None,
            openweather_url: DEFAULT_OPENWEATHER_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            weather_secret_id: get(WEATHER_SECRET_VAR),
            geocoding_secret_id: get(GEOCODING_SECRET_VAR),
            cache_table: get(CACHE_TABLE_VAR),
            topic_arn: get(TOPIC_ARN_VAR),
            openweather_url: get(OPENWEATHER_URL_VAR)
                .unwrap_or_else(|| DEFAULT_OPENWEATHER_URL.to_string()),
            geocoding_url: get(GEOCODING_URL_VAR)
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
        }
    }

    pub fn weather_secret_id(&self) -> Result<&str, WeatherscopeError> {
        require(&self.weather_secret_id, WEATHER_SECRET_VAR)
    }

    pub fn geocoding_secret_id(&self) -> Result<&str, WeatherscopeError> {
        require(&self.geocoding_secret_id, GEOCODING_SECRET_VAR)
    }

    pub fn cache_table(&self) -> Result<&str, WeatherscopeError> {
        require(&self.cache_table, CACHE_TABLE_VAR)
    }

    pub fn topic_arn(&self) -> Result<&str, WeatherscopeError> {
        require(&self.topic_arn, TOPIC_ARN_VAR)
    }
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, WeatherscopeError> {
    value.as_deref().ok_or(WeatherscopeError::MissingConfig(name))
}
