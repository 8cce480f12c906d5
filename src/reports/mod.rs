use axum::{routing::post, Router};

use crate::state::AppState;

pub(crate) mod dto;
pub mod handlers;
pub(crate) mod repo;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/reports",
        post(handlers::create_report)
            .get(handlers::list_reports)
            .delete(handlers::delete_all_reports),
    )
}
