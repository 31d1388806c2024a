use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use cityweather_core::WeatherSnapshot;
use tracing::instrument;

use crate::http::{
    error::ApiError,
    types::{ApiResponse, AppState, WeatherQuery},
};

/// `GET /weather?city=..&country=..`, public.
#[instrument(skip_all)]
pub async fn get_weather_handler(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<WeatherSnapshot>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let city = query.city.trim();
    if city.is_empty() {
        return Err(ApiError::bad_request("City name is required"));
    }

    let weather = state
        .saved_cities
        .provider()
        .fetch(city, query.country.as_deref())
        .await
        .map_err(|e| ApiError::from_weather(e, "Failed to fetch weather data"))?;

    Ok(Json(ApiResponse::ok(weather)))
}
