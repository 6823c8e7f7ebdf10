//! Core library for Weatherscope.
//!
//! This crate defines:
//! - Configuration read from the function environment
//! - Shared domain models (lookup requests, cache keys, notification text)
//! - Abstractions over the weather provider, geocoder and cloud services
//! - The weather lookup and notification handlers
//!
//! It is used by `weatherscope-cli`, which hosts the handlers on AWS Lambda.

pub mod config;
pub mod error;
pub mod geocode;
pub mod handler;
pub mod model;
pub mod provider;
pub mod store;

pub use config::Config;
pub use error::WeatherscopeError;
pub use geocode::{Geocoder, GoogleGeocoder};
pub use handler::{NotificationDispatcher, WeatherLookup};
pub use model::{CacheKey, LookupRequest, LookupResponse, NotificationMessage, PlaceName};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use store::{CacheStore, Notifier, SecretStore};
