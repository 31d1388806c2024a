use anyhow::Context;
use cityweather_core::{
    Config, InMemoryUserStore, JsonFileUserStore, SavedCities, UserStore, WeatherProvider,
    provider::provider_from_config,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub saved_cities: SavedCities,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            saved_cities: SavedCities::new(store, provider),
        }
    }

    /// Build the provider and open the configured user store.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = Arc::new(provider_from_config(config));

        let store: Arc<dyn UserStore> = match &config.store.data_file {
            Some(path) => Arc::new(
                JsonFileUserStore::open(path)
                    .await
                    .with_context(|| format!("Failed to open user data file: {}", path.display()))?,
            ),
            None => {
                warn!("No user data file configured; users are kept in memory only");
                Arc::new(InMemoryUserStore::new())
            }
        };

        info!("Application state initialized");
        Ok(Self::new(store, provider))
    }
}

/// Envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
}
