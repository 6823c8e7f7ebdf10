use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    model::{CacheKey, LookupRequest, LookupResponse},
    provider::WeatherProvider,
    store::{CacheStore, SecretStore},
};

/// Cached historical weather lookup.
///
/// A cache hit returns without touching the secret store or the provider. On a
/// miss the provider key is fetched fresh, the payload is fetched and written
/// back on a best-effort basis.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    config: Config,
    secrets: Arc<dyn SecretStore>,
    cache: Arc<dyn CacheStore>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherLookup {
    pub fn new(
        config: Config,
        secrets: Arc<dyn SecretStore>,
        cache: Arc<dyn CacheStore>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self { config, secrets, cache, provider }
    }

    /// Decode a raw invocation event, then run [`WeatherLookup::handle`].
    pub async fn handle_event(&self, event: Value) -> Result<LookupResponse> {
        let request: LookupRequest = serde_json::from_value(event)
            .context("Invalid weather lookup event")
            .inspect_err(|err| error!("weather lookup failed: {err:#}"))?;

        self.handle(request).await
    }

    pub async fn handle(&self, request: LookupRequest) -> Result<LookupResponse> {
        info!(?request, "received weather lookup");

        self.lookup(&request)
            .await
            .inspect_err(|err| error!("weather lookup failed: {err:#}"))
    }

    async fn lookup(&self, request: &LookupRequest) -> Result<LookupResponse> {
        let observation = request.observation()?;
        let key = CacheKey::from(&observation);

        if let Some(weather_data) = self.cached(&key).await {
            info!(%key, "cached weather data found");
            return Ok(LookupResponse { weather_data });
        }

        let secret_id = self.config.weather_secret_id()?;
        let api_key = self
            .secrets
            .get_secret(secret_id)
            .await
            .context("Failed to retrieve weather API key")?;

        let weather_data = self
            .provider
            .fetch_historical(&observation, &api_key)
            .await
            .with_context(|| format!("Failed to fetch weather data for {key}"))?;
        info!(%key, "weather data fetched from provider");

        self.store(&key, &weather_data).await;

        Ok(LookupResponse { weather_data })
    }

    /// Read-through. Any cache failure is a miss; a stored JSON `null` is too.
    async fn cached(&self, key: &CacheKey) -> Option<Value> {
        let raw = match self.cache.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, "error fetching cached weather data: {err:#}");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%key, "discarding unreadable cached weather data: {err}");
                None
            }
        }
    }

    /// Write-through. Failures are logged and dropped.
    async fn store(&self, key: &CacheKey, weather_data: &Value) {
        let serialized = match serde_json::to_string(weather_data) {
            Ok(s) => s,
            Err(err) => {
                warn!(%key, "unable to serialize weather data for caching: {err}");
                return;
            }
        };

        match self.cache.put_item(key, serialized).await {
            Ok(()) => info!(%key, "weather data cached"),
            Err(err) => warn!(%key, "error caching weather data: {err:#}"),
        }
    }
}
