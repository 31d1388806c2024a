pub mod error;
pub mod router;
pub mod session;
pub mod types;
pub mod handlers {
    pub mod health;
    pub mod saved_cities;
    pub mod weather;
}

pub use error::ApiError;
pub use router::create_router;
pub use session::Session;
pub use types::{ApiResponse, AppState};
