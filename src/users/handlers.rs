use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::ValidationError,
    state::AppState,
    users::{
        dto::UserOut,
        repo_types::UserRecord,
        services::{parse_json_body, register_user, validate_user_create},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/", post(create_user).get(list_users))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserOut>), ValidationError> {
    let payload = parse_json_body(&body)
        .inspect_err(|e| warn!(error = %e, "unreadable request body"))?;

    let user = validate_user_create(&payload)
        .inspect_err(|e| warn!(fields = ?e.fields(), "registration rejected"))?;

    let record = register_user(state.users.as_ref(), user).await;
    info!(username = %record.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserOut::from(&record))))
}

/// Returns stored records unshaped, password digest included.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<UserRecord>> {
    Json(state.users.list().await)
}
