//! HTTP surface of the `cityweather` backend.
//!
//! The binary in `main.rs` wires configuration and logging around [`http::create_router`].

pub mod http;

pub use http::{AppState, create_router};
