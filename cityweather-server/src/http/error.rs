//! Translation of service failures into HTTP responses.
//!
//! Clients only ever see a fixed message per error kind; the underlying
//! error is logged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cityweather_core::{ValidationError, WeatherError};
use tracing::error;

use super::types::ApiResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a service error, using `fallback` for anything without a dedicated status.
    pub fn from_weather(err: WeatherError, fallback: &'static str) -> Self {
        error!(error = %err, "{fallback}");

        match err {
            WeatherError::CityNotFound => Self::new(StatusCode::NOT_FOUND, "City not found"),
            WeatherError::DuplicateCity => Self::new(StatusCode::CONFLICT, "City already saved"),
            WeatherError::InvalidCredentials => {
                Self::internal("Weather service configuration error")
            }
            WeatherError::Invalid(ValidationError(message)) => Self::bad_request(message),
            WeatherError::FetchFailed(_) | WeatherError::NoSavedCities | WeatherError::Store(_) => {
                Self::internal(fallback)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::message(false, self.message))).into_response()
    }
}
