use axum::{routing::post, Router};

use crate::state::AppState;

pub mod client;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new().route("/reports/summary", post(handlers::generate_summary))
}
