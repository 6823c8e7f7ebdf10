use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::model::Observation;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Upstream source of historical weather observations.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the raw provider payload for `observation`. The body is returned as
    /// parsed JSON without any schema or status validation.
    async fn fetch_historical(
        &self,
        observation: &Observation,
        api_key: &str,
    ) -> anyhow::Result<Value>;
}
