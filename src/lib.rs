pub mod api;
pub mod category;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod generate;
pub mod inference;
pub mod models;
pub mod progress;
pub mod prompts;
pub mod store;

use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{
    config::InferenceConfig,
    inference::{ChatClient, InferenceError, OpenAiClient},
};

/// `RUST_LOG` when set, `info` otherwise.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// The configured inference client, or `None` when no key is set.
pub fn inference_client(config: &InferenceConfig) -> Result<Option<Arc<dyn ChatClient>>, InferenceError> {
    match &config.api_key {
        Some(key) => {
            let client = OpenAiClient::new(key.clone(), config)?;
            Ok(Some(Arc::new(client)))
        }
        None => {
            warn!("INFERENCE_API_KEY is not set; inference routes will fail or fall back");
            Ok(None)
        }
    }
}
