//! HTTP API: student record routes plus health and metrics endpoints.

pub mod error;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{cors_layer, create_router};
