//! Saved-city endpoints. All of them require a [`Session`].

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use cityweather_core::{CityWeather, NewSavedCity, SavedCity, SavedCityPatch};
use tracing::instrument;

use crate::http::{
    error::ApiError,
    session::Session,
    types::{ApiResponse, AppState},
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

#[instrument(skip_all, fields(user = %user.id))]
pub async fn add_saved_city_handler(
    State(state): State<AppState>,
    Session(mut user): Session,
    payload: Result<Json<NewSavedCity>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SavedCity>>), ApiError> {
    let input = body(payload)?;

    let city = state
        .saved_cities
        .add(&mut user, input)
        .await
        .map_err(|e| ApiError::from_weather(e, "Failed to save city"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(city, "City saved successfully")),
    ))
}

#[instrument(skip_all, fields(user = %user.id))]
pub async fn list_saved_cities_handler(
    State(state): State<AppState>,
    Session(user): Session,
) -> Json<ApiResponse<Vec<SavedCity>>> {
    Json(ApiResponse::ok(state.saved_cities.list(&user)))
}

#[instrument(skip_all, fields(user = %user.id, city_id = %city_id))]
pub async fn update_saved_city_handler(
    State(state): State<AppState>,
    Session(mut user): Session,
    Path(city_id): Path<String>,
    payload: Result<Json<SavedCityPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<SavedCity>>, ApiError> {
    let patch = body(payload)?;

    let city = state
        .saved_cities
        .update(&mut user, &city_id, patch)
        .await
        .map_err(|e| ApiError::from_weather(e, "Failed to update city"))?;

    Ok(Json(ApiResponse::ok_with_message(city, "City updated successfully")))
}

#[instrument(skip_all, fields(user = %user.id, city_id = %city_id))]
pub async fn delete_saved_city_handler(
    State(state): State<AppState>,
    Session(mut user): Session,
    Path(city_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .saved_cities
        .delete(&mut user, &city_id)
        .await
        .map_err(|e| ApiError::from_weather(e, "Failed to delete city"))?;

    Ok(Json(ApiResponse::message(true, "City deleted successfully")))
}

#[instrument(skip_all, fields(user = %user.id))]
pub async fn saved_cities_weather_handler(
    State(state): State<AppState>,
    Session(user): Session,
) -> Json<ApiResponse<Vec<CityWeather>>> {
    Json(ApiResponse::ok(state.saved_cities.weather_for_saved_cities(&user).await))
}
