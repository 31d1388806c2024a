use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::http::{
    handlers::{health, saved_cities, weather},
    types::AppState,
};

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/weather", get(weather::get_weather_handler))
        .route(
            "/saved-cities",
            post(saved_cities::add_saved_city_handler).get(saved_cities::list_saved_cities_handler),
        )
        // Static segment wins over `:city_id`, so PUT/DELETE here are 405, never an update.
        .route("/saved-cities/weather", get(saved_cities::saved_cities_weather_handler))
        .route(
            "/saved-cities/:city_id",
            put(saved_cities::update_saved_city_handler)
                .delete(saved_cities::delete_saved_city_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
