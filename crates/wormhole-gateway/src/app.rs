use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    delete_url_handler, get_url_handler, health_handler, redirect_handler, restore_url_handler,
    shorten_url_handler, validate_url_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/v1/urls", post(shorten_url_handler))
            .route("/v1/urls/validate", post(validate_url_handler))
            .route(
                "/v1/urls/{code}",
                get(get_url_handler).delete(delete_url_handler),
            )
            .route("/v1/urls/{code}/restore", post(restore_url_handler))
            .route("/{code}", get(redirect_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
