use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use cityweather_core::User;
use tracing::{debug, error};

use super::{error::ApiError, types::AppState};

/// The user behind the request's `Authorization: Bearer <token>` header.
///
/// Rejects with 401 when the header is missing or the token is unknown.
#[derive(Debug, Clone)]
pub struct Session(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(ApiError::unauthorized)?;

        match state.saved_cities.store().load_by_session(token).await {
            Ok(Some(user)) => Ok(Session(user)),
            Ok(None) => {
                debug!("Rejected unknown session token");
                Err(ApiError::unauthorized())
            }
            Err(e) => {
                error!(error = %e, "Failed to load user for session");
                Err(ApiError::internal("Authentication failed"))
            }
        }
    }
}
