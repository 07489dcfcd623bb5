use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: &'static str,
}

pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(ping))
}

/// Liveness probe.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "FastAPI Server is running!",
    })
}
