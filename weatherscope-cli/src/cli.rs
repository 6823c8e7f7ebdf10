use std::{io, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;
use weatherscope_core::{
    Config, GoogleGeocoder, NotificationDispatcher, OpenWeatherProvider,
    WeatherLookup,
    store::aws::{DynamoCacheStore, SecretsManagerStore, SnsNotifier, load_sdk_config},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherscope", version, about = "Weatherscope lookup and notification functions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Function {
    /// Cached historical weather lookup.
    Lookup,
    /// Reverse-geocoded notification publish.
    Notify,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve a function under the AWS Lambda runtime.
    Serve {
        #[arg(value_enum, env = "WEATHERSCOPE_FUNCTION")]
        function: Function,
    },

    /// Run a single invocation and print the JSON result.
    Invoke {
        #[arg(value_enum)]
        function: Function,

        /// Event JSON; read from stdin when absent.
        #[arg(long)]
        event: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { function } => {
                let handler = Arc::new(Handler::build(function).await);
                info!(?function, "weatherscope function starting");

                lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
                    let handler = Arc::clone(&handler);
                    async move {
                        handler.invoke(event.payload).await.map_err(lambda_runtime::Error::from)
                    }
                }))
                .await
                .map_err(|err| anyhow!("Lambda runtime exited: {err}"))
            }
            Command::Invoke { function, event } => {
                let raw = match event {
                    Some(raw) => raw,
                    None => io::read_to_string(io::stdin()).context("Failed to read event from stdin")?,
                };
                let event: Value = serde_json::from_str(&raw).context("Event is not valid JSON")?;

                let handler = Handler::build(function).await;
                let output = handler.invoke(event).await?;
                println!("{}", serde_json::to_string_pretty(&output)?);
                Ok(())
            }
        }
    }
}

/// One handler wired to the AWS-backed collaborators, built once per process.
enum Handler {
    Lookup(WeatherLookup),
    Notify(NotificationDispatcher),
}

impl Handler {
    async fn build(function: Function) -> Self {
        let config = Config::from_env();
        let sdk = load_sdk_config().await;
        let secrets = Arc::new(SecretsManagerStore::new(&sdk));

        match function {
            Function::Lookup => Handler::Lookup(WeatherLookup::new(
                config.clone(),
                secrets,
                Arc::new(DynamoCacheStore::new(&sdk, &config)),
                Arc::new(OpenWeatherProvider::new(config.openweather_url.clone())),
            )),
            Function::Notify => Handler::Notify(NotificationDispatcher::new(
                config.clone(),
                secrets,
                Arc::new(GoogleGeocoder::new(config.geocoding_url.clone())),
                Arc::new(SnsNotifier::new(&sdk)),
            )),
        }
    }

    async fn invoke(&self, event: Value) -> anyhow::Result<Value> {
        match self {
            Handler::Lookup(lookup) => {
                let response = lookup.handle_event(event).await?;
                Ok(serde_json::to_value(response)?)
            }
            Handler::Notify(dispatcher) => dispatcher.handle(event).await,
        }
    }
}
