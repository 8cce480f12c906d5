use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
mod jwt;
mod password;
pub(crate) mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::admin_routes())
}
