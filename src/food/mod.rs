use axum::Router;

use crate::state::AppState;

mod dto;
mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::lookup_routes())
        .merge(handlers::log_routes())
}
