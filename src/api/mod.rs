//! HTTP API
//!
//! - `GET /scrape_website` crawls the configured site and returns its text
//! - `POST /predict` answers a question from the site text
//! - `GET /health` reports liveness and the crate version

mod handlers;

pub use handlers::PredictRequest;

use crate::context::AppContext;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Builds the router over a shared context
pub fn create_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/scrape_website", get(handlers::scrape_website))
        .route("/predict", post(handlers::predict))
        .with_state(ctx)
}
