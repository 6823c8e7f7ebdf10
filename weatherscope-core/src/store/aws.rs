use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig, meta::region::RegionProviderChain};
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::debug;

use crate::{
    config::Config,
    error::WeatherscopeError,
    model::CacheKey,
    store::{CacheStore, Notifier, SecretStore},
};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const SECRET_VERSION_STAGE: &str = "AWSCURRENT";
pub const KEY_ATTRIBUTE: &str = "location";
pub const VALUE_ATTRIBUTE: &str = "weatherData";

/// Shared SDK config, resolved once per process.
pub async fn load_sdk_config() -> SdkConfig {
    let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    aws_config::defaults(BehaviorVersion::latest()).region(region).load().await
}

#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { client: aws_sdk_secretsmanager::Client::new(sdk) }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, id: &str) -> Result<String> {
        let out = self
            .client
            .get_secret_value()
            .secret_id(id)
            .version_stage(SECRET_VERSION_STAGE)
            .send()
            .await
            .with_context(|| format!("Failed to retrieve secret '{id}'"))?;

        out.secret_string()
            .map(str::to_owned)
            .ok_or_else(|| WeatherscopeError::EmptySecret(id.to_string()).into())
    }
}

/// Weather cache in a DynamoDB table keyed by the `location` string attribute.
#[derive(Debug, Clone)]
pub struct DynamoCacheStore {
    client: aws_sdk_dynamodb::Client,
    table: Option<String>,
}

impl DynamoCacheStore {
    pub fn new(sdk: &SdkConfig, config: &Config) -> Self {
        Self {
            client: aws_sdk_dynamodb::Client::new(sdk),
            table: config.cache_table.clone(),
        }
    }

    fn table(&self) -> Result<&str, WeatherscopeError> {
        self.table
            .as_deref()
            .ok_or(WeatherscopeError::MissingConfig(crate::config::CACHE_TABLE_VAR))
    }
}

#[async_trait]
impl CacheStore for DynamoCacheStore {
    async fn get_item(&self, key: &CacheKey) -> Result<Option<String>> {
        let table = self.table()?;

        let out = self
            .client
            .get_item()
            .table_name(table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .send()
            .await
            .with_context(|| format!("Failed to read '{key}' from table '{table}'"))?;

        let Some(item) = out.item() else {
            return Ok(None);
        };

        let value = item
            .get(VALUE_ATTRIBUTE)
            .context("Cached item has no weatherData attribute")?
            .as_s()
            .map_err(|_| anyhow::anyhow!("Cached weatherData attribute is not a string"))?;

        Ok(Some(value.clone()))
    }

    async fn put_item(&self, key: &CacheKey, value: String) -> Result<()> {
        let table = self.table()?;

        self.client
            .put_item()
            .table_name(table)
            .item(KEY_ATTRIBUTE, AttributeValue::S(key.to_string()))
            .item(VALUE_ATTRIBUTE, AttributeValue::S(value))
            .send()
            .await
            .with_context(|| format!("Failed to write '{key}' to table '{table}'"))?;

        debug!(%key, table, "cache item written");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self { client: aws_sdk_sns::Client::new(sdk) }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, topic: &str, message: &str) -> Result<()> {
        let out = self
            .client
            .publish()
            .topic_arn(topic)
            .message(message)
            .send()
            .await
            .with_context(|| format!("Failed to publish notification to '{topic}'"))?;

        debug!(message_id = out.message_id().unwrap_or_default(), "notification published");
        Ok(())
    }
}
