use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::{
    config::OpenWeatherConfig,
    error::WeatherError,
    model::{Coordinates, Temperature, WeatherCondition, WeatherSnapshot, Wind},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    config: OpenWeatherConfig,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: OpenWeatherConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }

    async fn fetch_current(&self, query: &str) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| WeatherError::fetch_failed("OpenWeatherMap API key not configured"))?;

        let url = format!("{}/weather", self.config.base_url.trim_end_matches('/'));

        info!("Fetching weather data for: {query}");

        let res = self
            .http
            .get(&url)
            .query(&[("q", query), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                WeatherError::fetch_failed(format!("Failed to send request to OpenWeather: {e}"))
            })?;

        let status = res.status();
        match status {
            StatusCode::NOT_FOUND => return Err(WeatherError::CityNotFound),
            StatusCode::UNAUTHORIZED => return Err(WeatherError::InvalidCredentials),
            _ => {}
        }

        let body = res.text().await.map_err(|e| {
            WeatherError::fetch_failed(format!("Failed to read OpenWeather response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(WeatherError::fetch_failed(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        // Error payloads carry nothing but `cod` and `message`, so check the code first.
        let envelope: OwEnvelope = serde_json::from_str(&body).map_err(|e| {
            WeatherError::fetch_failed(format!("Failed to parse OpenWeather JSON: {e}"))
        })?;
        let cod = envelope.cod.as_ref().and_then(OwCode::value);
        if cod != Some(200) {
            return Err(WeatherError::fetch_failed(format!(
                "Weather API error: {}",
                envelope.cod.map(|c| c.to_string()).unwrap_or_else(|| "missing".into()),
            )));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::fetch_failed(format!("Failed to parse OpenWeather JSON: {e}"))
        })?;

        Ok(parsed.into_snapshot())
    }
}

/// `name` or `name,country`, the form OpenWeather expects in `q`.
pub fn build_query(city: &str, country: Option<&str>) -> String {
    match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(country) => format!("{city},{country}"),
        None => city.to_string(),
    }
}

/// OpenWeather sends `cod` as a number on success and as a string on most errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn value(&self) -> Option<i64> {
        match self {
            OwCode::Number(n) => Some(*n),
            OwCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for OwCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwCode::Number(n) => write!(f, "{n}"),
            OwCode::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    #[serde(default)]
    cod: Option<OwCode>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lon: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u32,
    main: String,
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    sys: OwSys,
    name: String,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        WeatherSnapshot {
            coordinates: Coordinates {
                latitude: self.coord.lat,
                longitude: self.coord.lon,
            },
            conditions: self
                .weather
                .into_iter()
                .map(|w| WeatherCondition {
                    code: w.id,
                    main: w.main,
                    description: w.description,
                    icon: w.icon,
                })
                .collect(),
            temperature: Temperature {
                current: self.main.temp,
                feels_like: self.main.feels_like,
                min: self.main.temp_min,
                max: self.main.temp_max,
            },
            pressure: self.main.pressure,
            humidity: self.main.humidity,
            wind: Wind {
                speed: self.wind.speed,
                direction: self.wind.deg,
            },
            cloud_coverage: self.clouds.all,
            country: self.sys.country,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            city_name: self.name,
            status_code: 200,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn fetch(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let query = build_query(city, country);
        self.fetch_current(&query).await.inspect_err(|e| {
            error!(query = %query, error = %e, "Error fetching weather data");
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
