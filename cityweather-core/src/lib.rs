//! Core library for the `cityweather` backend.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider client
//! - Saved-city management on top of an abstract user store
//! - Shared domain models and the error taxonomy
//!
//! It is used by `cityweather-server`, but does not depend on any HTTP framework.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod saved_cities;
pub mod store;

pub use config::{Config, OpenWeatherConfig, ServerConfig, StoreConfig};
pub use error::{StoreError, ValidationError, WeatherError};
pub use model::{
    CityWeather, Coordinates, NewSavedCity, SavedCity, SavedCityPatch, User, WeatherSnapshot,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use saved_cities::SavedCities;
pub use store::{InMemoryUserStore, JsonFileUserStore, UserStore};
