use thiserror::Error;

/// Failures raised by the user store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access user data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize user data: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Every way a weather lookup or saved-city operation can fail.
///
/// Handlers match on the variant; the display text is for logs only.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City not found")]
    CityNotFound,

    #[error("City already saved")]
    DuplicateCity,

    #[error("Invalid API key")]
    InvalidCredentials,

    #[error("Failed to fetch weather data: {0}")]
    FetchFailed(String),

    #[error("No saved cities found")]
    NoSavedCities,

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Failed to persist user: {0}")]
    Store(#[from] StoreError),
}

impl WeatherError {
    pub(crate) fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::FetchFailed(reason.into())
    }
}

/// A request field that failed validation. The message is safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);
