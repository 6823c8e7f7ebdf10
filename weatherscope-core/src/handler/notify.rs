use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    config::Config,
    geocode::Geocoder,
    model::{Action, NotificationMessage, NotificationRequest},
    store::{Notifier, SecretStore, strip_secret_braces},
};

/// Publishes a human-readable note about a weather lookup, naming the place
/// the coordinates resolve to. Returns the incoming event unchanged.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    config: Config,
    secrets: Arc<dyn SecretStore>,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(
        config: Config,
        secrets: Arc<dyn SecretStore>,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { config, secrets, geocoder, notifier }
    }

    pub async fn handle(&self, event: Value) -> Result<Value> {
        info!(%event, "received notification request");

        self.dispatch(&event)
            .await
            .inspect_err(|err| error!("notification dispatch failed: {err:#}"))?;

        Ok(event)
    }

    async fn dispatch(&self, event: &Value) -> Result<()> {
        let secret_id = self.config.geocoding_secret_id()?;
        let raw_key = self
            .secrets
            .get_secret(secret_id)
            .await
            .context("Failed to retrieve geocoding API key")?;
        let api_key = strip_secret_braces(&raw_key);

        let request =
            NotificationRequest::from_event(event).context("Invalid notification event")?;

        let place = self
            .geocoder
            .reverse_geocode(request.latitude, request.longitude, &api_key)
            .await?;

        let action = Action::parse(&request.action);
        let message = NotificationMessage::compose(&action, request.timestamp, &place, &Local);

        let topic = self.config.topic_arn()?;
        self.notifier.publish(topic, message.as_str()).await?;

        info!(?action, "notification sent");
        Ok(())
    }
}
