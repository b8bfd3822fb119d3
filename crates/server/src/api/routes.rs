use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use super::handlers;
use crate::state::AppState;

pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::handle_version))
        .route("/list", get(handlers::handle_list))
        .route("/spec", get(handlers::handle_spec))
        .route("/say", post(handlers::handle_say))
        .route("/command", post(handlers::handle_command))
        .route("/last_ask", get(handlers::handle_last_ask))
}
