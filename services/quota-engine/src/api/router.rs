use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/quota/message", post(handlers::increment_message))
        .route("/api/quota/image-gen", post(handlers::increment_image_gen))
        .route("/api/quota/reset-check", post(handlers::reset_check))
        .route("/api/quota/:user_id/limits", get(handlers::get_limits))
        .route("/api/wallet/:user_id", get(handlers::get_wallet))
        .route("/api/wallet/award", post(handlers::award_coins))
        .route("/api/wallet/spend", post(handlers::spend_coins))
        .route("/api/tier/upgrade", post(handlers::upgrade_tier))
        .route("/api/promo", post(handlers::create_promo))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
