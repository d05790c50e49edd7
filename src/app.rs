use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/countries", get(handlers::get_countries))
        .route("/api/series/:country", get(handlers::get_series))
        .route("/api/smoothed/:country", get(handlers::get_smoothed))
        .route("/api/charts", post(handlers::post_charts))
        .with_state(state)
}
