use crate::{Config, WeatherError, WeatherSnapshot, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::warn;

pub mod openweather;

/// Source of current weather conditions for a named city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One lookup, no retries and no caching.
    async fn fetch(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the OpenWeather provider from config.
///
/// A missing API key is not fatal: it is logged here and every fetch fails until one is set.
pub fn provider_from_config(config: &Config) -> OpenWeatherProvider {
    if !config.is_api_key_configured() {
        warn!(
            "OpenWeather API key not found (set {} or run `cityweather configure`)",
            crate::config::API_KEY_ENV
        );
    }

    OpenWeatherProvider::new(config.openweather.clone())
}
