use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::model::Observation;

use super::WeatherProvider;

const TIMEMACHINE_PATH: &str = "/data/2.5/onecall/timemachine";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn timemachine_url(&self) -> String {
        format!("{}{}", self.base_url, TIMEMACHINE_PATH)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_historical(&self, observation: &Observation, api_key: &str) -> Result<Value> {
        let url = self.timemachine_url();
        let lat = observation.latitude.to_string();
        let lon = observation.longitude.to_string();
        let dt = observation.timestamp.to_string();

        debug!(
            url = %url,
            lat = %lat,
            lon = %lon,
            dt = %dt,
            units = %observation.unit,
            "requesting OpenWeather timemachine"
        );

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("dt", dt.as_str()),
                ("units", observation.unit.as_str()),
                ("appid", api_key),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (timemachine)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather timemachine response body")?;

        debug!(%status, bytes = body.len(), "OpenWeather response received");

        serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse OpenWeather timemachine JSON: {}", truncate_body(&body))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn observation() -> Observation {
        Observation { longitude: 10.0, latitude: 20.0, timestamp: 1000, unit: "metric".into() }
    }

    #[tokio::test]
    async fn sends_expected_query_and_returns_body() {
        let server = MockServer::start().await;
        let body = json!({ "lat": 20, "lon": 10, "current": { "temp": 18.2 } });

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall/timemachine"))
            .and(query_param("lat", "20"))
            .and(query_param("lon", "10"))
            .and(query_param("dt", "1000"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(server.uri());
        let data = provider.fetch_historical(&observation(), "KEY").await.unwrap();

        assert_eq!(data, body);
    }

    #[tokio::test]
    async fn error_status_body_is_passed_through() {
        let server = MockServer::start().await;
        let body = json!({ "cod": 401, "message": "Invalid API key" });

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall/timemachine"))
            .respond_with(ResponseTemplate::new(401).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(format!("{}/", server.uri()));
        let data = provider.fetch_historical(&observation(), "BAD").await.unwrap();

        assert_eq!(data, body);
    }

    #[tokio::test]
    async fn non_json_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(server.uri());
        let err = provider.fetch_historical(&observation(), "KEY").await.unwrap_err();

        assert!(err.to_string().contains("Failed to parse OpenWeather timemachine JSON"));
    }

    #[test]
    fn truncates_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
