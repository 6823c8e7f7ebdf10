//! Capabilities the handlers borrow from the hosting cloud.
//!
//! Handlers only see these traits, so tests run against in-memory fakes
//! while deployed functions use the AWS clients in [`aws`].

use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::CacheKey;

pub mod aws;

#[async_trait]
pub trait SecretStore: Send + Sync + Debug {
    /// Current string value of the secret `id`.
    async fn get_secret(&self, id: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Serialized weather payload stored under `key`, if any.
    async fn get_item(&self, key: &CacheKey) -> anyhow::Result<Option<String>>;

    async fn put_item(&self, key: &CacheKey, value: String) -> anyhow::Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn publish(&self, topic: &str, message: &str) -> anyhow::Result<()>;
}

/// Remove brace and parenthesis characters some secrets are stored wrapped in.
pub fn strip_secret_braces(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '{' | '}' | '(' | ')')).collect()
}
